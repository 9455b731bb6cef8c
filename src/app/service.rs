//! Application service: the hexagonal core.
//!
//! [`NodeService`] owns every piece of mutable node state: identity, the
//! creature, the scheduler's timers, the protocol client, and the status
//! signal.  It is the single writer of the creature record.  Storage,
//! connectivity, and event output are injected at each call site through
//! port traits, so the whole service runs against mocks on the host.
//!
//! ```text
//!  PersistencePort ──▶ ┌──────────────────────────────┐ ──▶ EventSink
//!                      │          NodeService          │
//! ConnectivityPort ──▶ │ Scheduler · Creature · Client │ ──▶ StatusPattern
//!                      └──────────────┬───────────────┘
//!                                     ▼
//!                               HttpTransport
//! ```

use log::{info, warn};

use crate::capabilities::DeviceCapabilities;
use crate::config::NodeConfig;
use crate::creature::store as record;
use crate::creature::{Creature, Element, GameMode, VisualState};
use crate::error::{ArenaError, EvolveError};
use crate::identity::{self, NodeIdentity};
use crate::protocol::transport::HttpTransport;
use crate::protocol::{GameCommand, HeartbeatClient, HeartbeatRequest};
use crate::scheduler::{Scheduler, TaskId};
use crate::status::{StatusPattern, StatusSignal};

use super::commands::{AppCommand, CommandOutcome};
use super::events::AppEvent;
use super::ports::{ConnectivityPort, EventSink, GeoFix, PersistencePort, SchedulerDelegate, ns};

const DEFAULT_CREATURE_NAME: &str = "Mohn";

/// Hardware facts needed once at boot.
#[derive(Debug, Clone, Copy)]
pub struct BootInfo {
    /// Factory MAC (node id source on first boot).
    pub mac: [u8; 6],
    /// Hardware entropy for a new creature id.
    pub nonce: u64,
}

// ───────────────────────────────────────────────────────────────
// Due-task collection
// ───────────────────────────────────────────────────────────────

/// Collects due tasks during [`Scheduler::tick`] so they can be run
/// afterwards with full access to the service.
struct DueCollector {
    arena_open: bool,
    due: heapless::Vec<TaskId, 8>,
}

impl SchedulerDelegate for DueCollector {
    fn is_enabled(&self, task: TaskId) -> bool {
        task != TaskId::ArenaTick || self.arena_open
    }

    fn on_task_due(&mut self, task: TaskId, _now_ms: u64) {
        let _ = self.due.push(task);
    }
}

// ───────────────────────────────────────────────────────────────
// NodeService
// ───────────────────────────────────────────────────────────────

pub struct NodeService<T: HttpTransport> {
    config: NodeConfig,
    caps: DeviceCapabilities,
    identity: NodeIdentity,
    creature: Creature,
    scheduler: Scheduler,
    client: HeartbeatClient<T>,
    status: StatusSignal,
    location: Option<GeoFix>,
    boot_ms: u64,
    last_decay_ms: u64,
}

impl<T: HttpTransport> NodeService<T> {
    // ── Lifecycle ─────────────────────────────────────────────

    /// Load identity and creature (hatching a new egg on first boot), build
    /// the task table, and emit [`AppEvent::Started`].
    pub fn boot(
        config: NodeConfig,
        caps: DeviceCapabilities,
        transport: T,
        hw: BootInfo,
        now_ms: u64,
        store: &mut impl PersistencePort,
        sink: &mut impl EventSink,
    ) -> Self {
        let identity = NodeIdentity::load_or_create(store, &hw.mac);
        let element = Element::ALL[(hw.nonce % Element::ALL.len() as u64) as usize];
        let (state, hatched) = record::load_or_create(
            store,
            || identity::creature_id(&identity.node_id, hw.nonce),
            DEFAULT_CREATURE_NAME,
            element,
        );

        let mut rules = config.creature_rules();
        rules.tier = caps.tier;
        let creature = Creature::new(state, rules);
        let scheduler = Scheduler::from_config(&config, now_ms);
        let client = HeartbeatClient::new(transport, &config);
        let status = StatusSignal::new(caps.status_led, config.ack_blink_ms as u64);

        let s = creature.state();
        info!(
            "NodeService: node {} (owner '{}'), creature {} {:?} Lv{}, tier {:?}",
            identity.node_id, identity.owner_id, s.id, s.stage, s.level, caps.tier
        );
        sink.emit(&AppEvent::Started {
            creature_id: s.id.as_str().into(),
            stage: s.stage,
            level: s.level,
            hatched,
        });

        Self {
            config,
            caps,
            identity,
            creature,
            scheduler,
            client,
            status,
            location: None,
            boot_ms: now_ms,
            last_decay_ms: now_ms,
        }
    }

    // ── Per-tick orchestration ────────────────────────────────

    /// Run every due task (Heartbeat, ArenaTick, MoodDecay, AutoSave, in
    /// that order), then re-derive the status pattern.
    pub fn tick(
        &mut self,
        now_ms: u64,
        store: &mut impl PersistencePort,
        link: &impl ConnectivityPort,
        sink: &mut impl EventSink,
    ) -> StatusPattern {
        let mut collector = DueCollector {
            arena_open: self.creature.game_mode() == GameMode::Arena,
            due: heapless::Vec::new(),
        };
        self.scheduler.tick(now_ms, &mut collector);

        for task in collector.due {
            match task {
                TaskId::Heartbeat => self.run_heartbeat(now_ms, store, link, sink),
                TaskId::ArenaTick => {
                    self.run_arena_tick(now_ms, store, link, sink);
                }
                TaskId::MoodDecay => self.run_mood_decay(now_ms),
                TaskId::AutoSave => {
                    record::persist(store, self.creature.state());
                }
                TaskId::EggCheck => {}
            }
        }

        self.status
            .update(now_ms, link.is_connected(), self.creature.game_mode())
    }

    // ── Command handling ──────────────────────────────────────

    /// Apply a local input immediately.
    pub fn handle_command(
        &mut self,
        cmd: AppCommand,
        now_ms: u64,
        store: &mut impl PersistencePort,
        link: &impl ConnectivityPort,
        sink: &mut impl EventSink,
    ) -> CommandOutcome {
        let tuning = self.creature.rules().mood;
        match cmd {
            AppCommand::Feed => {
                self.creature.feed(tuning.input_feed);
                self.creature.set_state(VisualState::Eating, now_ms);
            }
            AppCommand::Play => {
                self.creature.play(tuning.input_play);
                self.creature.set_state(VisualState::Happy, now_ms);
            }
            AppCommand::Rest => {
                self.creature.rest(tuning.input_rest);
                self.creature.set_state(VisualState::Sleeping, now_ms);
            }
            AppCommand::CycleGameMode => {
                let from = self.creature.game_mode();
                let to = self.creature.cycle_game_mode();
                self.mode_changed(from, to, sink);
            }
            AppCommand::SetGameMode(mode) => {
                if !self.change_mode(mode, sink) {
                    return CommandOutcome::Ignored;
                }
            }
            AppCommand::Attack => {
                if !self.run_arena_tick(now_ms, store, link, sink) {
                    return CommandOutcome::Ignored;
                }
                self.scheduler.mark_fired(TaskId::ArenaTick, now_ms);
                return CommandOutcome::Applied;
            }
            AppCommand::TriggerHeartbeat => {
                self.scheduler.mark_fired(TaskId::Heartbeat, now_ms);
                self.run_heartbeat(now_ms, store, link, sink);
                return CommandOutcome::Applied;
            }
            AppCommand::FactoryReset => {
                warn!("NodeService: factory reset");
                for namespace in ns::ALL {
                    if let Err(e) = store.clear(namespace) {
                        warn!("NodeService: clearing '{}' failed: {}", namespace, e);
                    }
                }
                sink.emit(&AppEvent::FactoryReset);
                return CommandOutcome::RestartRequired;
            }
        }
        record::persist(store, self.creature.state());
        CommandOutcome::Applied
    }

    /// Latest GPS fix; only reported when the board has GPS.
    pub fn update_location(&mut self, fix: GeoFix) {
        self.location = Some(fix);
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn creature(&self) -> &Creature {
        &self.creature
    }

    pub fn identity(&self) -> &NodeIdentity {
        &self.identity
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    pub fn capabilities(&self) -> &DeviceCapabilities {
        &self.caps
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn status(&self) -> StatusPattern {
        self.status.current()
    }

    pub fn transport_mut(&mut self) -> &mut T {
        self.client.transport_mut()
    }

    // ── Heartbeat cycle ───────────────────────────────────────

    fn run_heartbeat(
        &mut self,
        now_ms: u64,
        store: &mut impl PersistencePort,
        link: &impl ConnectivityPort,
        sink: &mut impl EventSink,
    ) {
        self.creature.add_heartbeat();
        let (mode, consecutive, heartbeats) = {
            let s = self.creature.state();
            (s.game_mode, s.consecutive_heartbeats, s.heartbeats)
        };
        let req = HeartbeatRequest {
            node_id: &self.identity.node_id,
            owner_id: &self.identity.owner_id,
            game_mode: mode,
            consecutive_heartbeats: consecutive,
            location: self.location.filter(|_| self.caps.gps),
            uptime_secs: now_ms.saturating_sub(self.boot_ms) / 1000,
        };
        let result = self.client.send_heartbeat(link, &req);
        let mut evolution_checked = false;

        if result.success {
            self.status.record_heartbeat(true);
            self.status.acknowledge(now_ms);
            let mut xp = result.xp_earned;
            if mode == GameMode::Hibernation {
                xp = xp.saturating_add(self.config.hibernation_xp_per_heartbeat);
            }
            self.credit_xp(xp, sink);
            sink.emit(&AppEvent::HeartbeatAcked {
                xp_earned: xp,
                total_xp: self.creature.state().total_xp,
            });
            if let Some(cmd) = result.game_command {
                evolution_checked = matches!(cmd, GameCommand::Evolve);
                self.apply_game_command(cmd, now_ms, sink);
            }
        } else {
            self.creature.reset_consecutive();
            self.status.record_heartbeat(false);
            sink.emit(&AppEvent::HeartbeatFailed);
        }

        self.run_egg_check(heartbeats, now_ms, link, sink);
        if !evolution_checked {
            self.check_evolution(now_ms, sink);
        }
        record::persist(store, self.creature.state());
    }

    /// Piggybacked on the heartbeat: only at exact multiples of the hatch
    /// threshold.
    fn run_egg_check(
        &mut self,
        heartbeats: u32,
        now_ms: u64,
        link: &impl ConnectivityPort,
        sink: &mut impl EventSink,
    ) {
        let threshold = self.config.egg_hatch_heartbeats;
        if heartbeats == 0 || threshold == 0 || heartbeats % threshold != 0 {
            return;
        }
        self.scheduler.mark_fired(TaskId::EggCheck, now_ms);
        let egg = self
            .client
            .send_check_egg(link, &self.identity.node_id, heartbeats);
        if egg.awarded() {
            info!("NodeService: egg {} ({}) awarded", egg.egg_id, egg.egg_type);
            self.creature.reset_consecutive();
            sink.emit(&AppEvent::EggAwarded {
                egg_id: egg.egg_id,
                egg_type: egg.egg_type,
            });
        }
    }

    fn apply_game_command(&mut self, cmd: GameCommand, now_ms: u64, sink: &mut impl EventSink) {
        let tuning = self.creature.rules().mood;
        match cmd {
            GameCommand::Evolve => self.check_evolution(now_ms, sink),
            GameCommand::Feed => {
                self.creature.feed(tuning.command_feed);
                self.creature.set_state(VisualState::Eating, now_ms);
            }
            GameCommand::Play => {
                self.creature.play(tuning.command_play);
                self.creature.set_state(VisualState::Happy, now_ms);
            }
            GameCommand::ArenaStart => {
                self.change_mode(GameMode::Arena, sink);
            }
            GameCommand::ArenaStop => {
                self.change_mode(GameMode::Idle, sink);
            }
        }
        sink.emit(&AppEvent::CommandApplied(cmd));
    }

    fn check_evolution(&mut self, now_ms: u64, sink: &mut impl EventSink) {
        if !self.creature.should_evolve() {
            return;
        }
        match self.creature.evolve() {
            Ok(stage) => {
                self.creature.set_state(VisualState::Evolving, now_ms);
                sink.emit(&AppEvent::Evolved { stage });
            }
            Err(EvolveError::DeviceTooSmall) => {
                if let Some(next) = self.creature.state().stage.next() {
                    sink.emit(&AppEvent::EvolutionDeferred { next });
                }
            }
            Err(EvolveError::FinalStage | EvolveError::NotReady) => {}
        }
    }

    // ── Arena ─────────────────────────────────────────────────

    /// One battle round.  Returns `false` when not in the arena.
    fn run_arena_tick(
        &mut self,
        now_ms: u64,
        store: &mut impl PersistencePort,
        link: &impl ConnectivityPort,
        sink: &mut impl EventSink,
    ) -> bool {
        if self.creature.game_mode() != GameMode::Arena {
            return false;
        }
        if !link.is_connected() {
            self.abandon_arena(store, sink);
            return true;
        }

        let result = self.client.send_arena_tick(
            link,
            &self.identity.node_id,
            &self.creature.state().id,
        );
        if !result.success {
            if !link.is_connected() {
                self.abandon_arena(store, sink);
            }
            return true;
        }

        if result.won {
            self.creature.set_state(VisualState::Celebrating, now_ms);
            if let Some(level) = self.creature.record_win(result.xp_earned) {
                sink.emit(&AppEvent::LevelUp { level });
            }
            sink.emit(&AppEvent::ArenaWon {
                opponent: result.opponent_name,
                xp: result.xp_earned,
            });
        } else {
            self.creature.set_state(VisualState::Hurt, now_ms);
            if let Some(level) = self.creature.record_loss(result.xp_earned) {
                sink.emit(&AppEvent::LevelUp { level });
            }
            let outcome = self.creature.take_damage(result.damage_taken);
            sink.emit(&AppEvent::ArenaLost {
                opponent: result.opponent_name,
                xp: result.xp_earned,
                damage: result.damage_taken,
            });
            if outcome.knocked_out {
                sink.emit(&AppEvent::KnockedOut);
                sink.emit(&AppEvent::GameModeChanged {
                    from: GameMode::Arena,
                    to: self.creature.game_mode(),
                });
            }
        }
        record::persist(store, self.creature.state());
        true
    }

    /// Link lost mid-battle: leave the arena synchronously.
    fn abandon_arena(&mut self, store: &mut impl PersistencePort, sink: &mut impl EventSink) {
        warn!("NodeService: link lost during arena tick, returning to Idle");
        if self.creature.set_game_mode(GameMode::Idle).is_ok() {
            sink.emit(&AppEvent::ArenaAbandoned);
            sink.emit(&AppEvent::GameModeChanged {
                from: GameMode::Arena,
                to: GameMode::Idle,
            });
        }
        record::persist(store, self.creature.state());
    }

    // ── Helpers ───────────────────────────────────────────────

    fn run_mood_decay(&mut self, now_ms: u64) {
        let elapsed = now_ms.saturating_sub(self.last_decay_ms);
        self.last_decay_ms = now_ms;
        self.creature.decay(elapsed);
    }

    fn credit_xp(&mut self, xp: u32, sink: &mut impl EventSink) {
        if let Some(level) = self.creature.add_xp(xp) {
            sink.emit(&AppEvent::LevelUp { level });
        }
    }

    /// Returns `false` when the switch was refused.
    fn change_mode(&mut self, mode: GameMode, sink: &mut impl EventSink) -> bool {
        match self.creature.set_game_mode(mode) {
            Ok(from) => {
                self.mode_changed(from, mode, sink);
                true
            }
            Err(ArenaError::KnockedOut) => {
                warn!("NodeService: cannot enter arena while knocked out");
                false
            }
        }
    }

    fn mode_changed(&self, from: GameMode, to: GameMode, sink: &mut impl EventSink) {
        if from != to {
            info!("NodeService: game mode {:?} → {:?}", from, to);
            sink.emit(&AppEvent::GameModeChanged { from, to });
        }
    }
}
