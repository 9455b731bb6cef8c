//! End-to-end scenarios for `NodeService`: heartbeat cycles, eggs, arena,
//! evolution gating and reset.

use mohnnode::adapters::nvs::NvsStore;
use mohnnode::app::commands::{AppCommand, CommandOutcome};
use mohnnode::app::events::AppEvent;
use mohnnode::app::ports::{GeoFix, PersistencePort, ns};
use mohnnode::capabilities::DeviceCapabilities;
use mohnnode::config::NodeConfig;
use mohnnode::creature::store::{self as record, keys};
use mohnnode::creature::{CreatureState, Element, GameMode, Stage, VisualState};
use mohnnode::error::TransportError;
use mohnnode::protocol::GameCommand;
use mohnnode::status::StatusPattern;

use crate::harness::Harness;
use crate::mock_ports::{Endpoint, ok};

// ── Heartbeat ─────────────────────────────────────────────────

#[test]
fn fresh_boot_first_heartbeat_credits_xp() {
    let mut h = Harness::new();
    assert!(matches!(
        h.sink.events[0],
        AppEvent::Started {
            hatched: true,
            stage: Stage::Egg,
            ..
        }
    ));

    h.transport()
        .heartbeat
        .push_back(ok(r#"{"success":true,"xpEarned":5}"#));
    let pattern = h.tick_at(0);

    let s = h.state();
    assert_eq!(s.total_xp, 5);
    assert_eq!(s.heartbeats, 1);
    assert_eq!(s.consecutive_heartbeats, 1);
    assert_eq!(s.stage, Stage::Egg);
    assert_eq!(pattern, StatusPattern::AckBlink);
    assert_eq!(h.transport().count(Endpoint::Heartbeat), 1);
    assert_eq!(h.transport().count(Endpoint::Egg), 0);
}

#[test]
fn heartbeat_request_carries_identity_and_mode() {
    let mut h = Harness::new();
    h.heartbeat();
    let node_id = h.node.identity().node_id.clone();
    let body = h.transport().last(Endpoint::Heartbeat).cloned().unwrap();
    assert_eq!(body["nodeId"], node_id.as_str());
    assert_eq!(body["gameMode"], 0);
    assert_eq!(body["consecutiveHeartbeats"], 1);
    assert!(body["firmwareVersion"].is_string());
}

#[test]
fn failed_heartbeat_breaks_the_streak() {
    let mut h = Harness::new();
    for _ in 0..3 {
        h.heartbeat();
    }
    assert_eq!(h.state().consecutive_heartbeats, 3);

    h.transport().heartbeat.push_back(Err(TransportError::Timeout));
    h.heartbeat();

    let s = h.state();
    assert_eq!(s.consecutive_heartbeats, 0);
    assert_eq!(s.heartbeats, 4);
    assert_eq!(s.total_xp, 3);
    assert_eq!(h.sink.count(|e| *e == AppEvent::HeartbeatFailed), 1);

    let now = h.now + 1;
    assert_eq!(h.tick_at(now), StatusPattern::Error);
}

#[test]
fn heartbeat_skipped_while_offline() {
    let mut h = Harness::new();
    h.link.set(false);
    let pattern = h.tick_at(0);

    assert_eq!(h.transport().count(Endpoint::Heartbeat), 0);
    assert_eq!(h.state().heartbeats, 1);
    assert_eq!(h.state().consecutive_heartbeats, 0);
    assert_eq!(pattern, StatusPattern::Error);
}

#[test]
fn status_settles_to_idle_pulse_after_ack() {
    let mut h = Harness::new();
    assert_eq!(h.tick_at(0), StatusPattern::AckBlink);
    assert_eq!(h.tick_at(1_000), StatusPattern::IdlePulse);
}

#[test]
fn heartbeats_follow_the_interval() {
    let mut h = Harness::new();
    h.tick_at(0);
    h.tick_at(299_999);
    assert_eq!(h.transport().count(Endpoint::Heartbeat), 1);
    h.tick_at(300_000);
    assert_eq!(h.transport().count(Endpoint::Heartbeat), 2);
}

#[test]
fn unknown_server_command_is_ignored_but_xp_counts() {
    let mut h = Harness::new();
    h.transport()
        .heartbeat
        .push_back(ok(r#"{"success":true,"xpEarned":3,"gameCommand":"dance"}"#));
    h.heartbeat();

    assert_eq!(h.state().total_xp, 3);
    assert_eq!(
        h.sink
            .count(|e| matches!(e, AppEvent::CommandApplied(_))),
        0
    );
}

#[test]
fn server_feed_is_applied_once() {
    let mut h = Harness::new();
    h.transport()
        .heartbeat
        .push_back(ok(r#"{"success":true,"xpEarned":1,"gameCommand":"feed"}"#));
    h.heartbeat();
    let at = h.now;

    assert_eq!(h.state().mood.hunger, 100);
    assert_eq!(
        h.sink
            .count(|e| *e == AppEvent::CommandApplied(GameCommand::Feed)),
        1
    );
    assert_eq!(h.node.creature().visual_state(at), VisualState::Eating);

    h.heartbeat();
    assert_eq!(
        h.sink
            .count(|e| *e == AppEvent::CommandApplied(GameCommand::Feed)),
        1
    );
}

#[test]
fn hibernation_adds_passive_xp() {
    let mut h = Harness::new();
    assert_eq!(
        h.command(AppCommand::SetGameMode(GameMode::Hibernation)),
        CommandOutcome::Applied
    );
    h.transport()
        .heartbeat
        .push_back(ok(r#"{"success":true,"xpEarned":5}"#));
    h.heartbeat();

    assert_eq!(h.state().total_xp, 6);
    assert!(h.sink.events.contains(&AppEvent::HeartbeatAcked {
        xp_earned: 6,
        total_xp: 6
    }));
    let body = h.transport().last(Endpoint::Heartbeat).cloned().unwrap();
    assert_eq!(body["gameMode"], 1);
}

#[test]
fn location_reported_only_with_gps() {
    let fix = GeoFix {
        lat: 52.5,
        lon: 13.4,
    };

    let mut nano = Harness::new();
    nano.node.update_location(fix);
    nano.heartbeat();
    let body = nano.transport().last(Endpoint::Heartbeat).cloned().unwrap();
    assert!(body.get("lat").is_none());

    let mut tank = Harness::with_caps(DeviceCapabilities::aquarium());
    tank.node.update_location(fix);
    tank.heartbeat();
    let body = tank.transport().last(Endpoint::Heartbeat).cloned().unwrap();
    assert_eq!(body["lat"], 52.5);
    assert_eq!(body["lon"], 13.4);
}

// ── Eggs ──────────────────────────────────────────────────────

#[test]
fn egg_checks_only_at_threshold_multiples() {
    let mut h = Harness::new();
    for _ in 0..300 {
        h.heartbeat();
    }
    let counts: Vec<u64> = h
        .transport()
        .requests
        .iter()
        .filter(|(e, _)| *e == Endpoint::Egg)
        .filter_map(|(_, body)| body["heartbeatCount"].as_u64())
        .collect();
    assert_eq!(counts, vec![144, 288]);
    assert_eq!(
        h.sink
            .count(|e| matches!(e, AppEvent::EggAwarded { .. })),
        0
    );
}

#[test]
fn egg_award_resets_streak_once() {
    let mut h = Harness::new();
    h.transport()
        .egg
        .push_back(ok(r#"{"success":true,"eggId":"abc","eggType":"volt"}"#));
    for _ in 0..144 {
        h.heartbeat();
    }

    assert_eq!(h.state().consecutive_heartbeats, 0);
    assert!(h.sink.events.contains(&AppEvent::EggAwarded {
        egg_id: "abc".into(),
        egg_type: "volt".into()
    }));

    for _ in 0..6 {
        h.heartbeat();
    }
    assert_eq!(h.state().consecutive_heartbeats, 6);
    assert_eq!(
        h.sink
            .count(|e| matches!(e, AppEvent::EggAwarded { .. })),
        1
    );
}

#[test]
fn egg_check_failure_keeps_streak() {
    let mut h = Harness::new();
    h.transport().egg.push_back(Err(TransportError::Io));
    for _ in 0..144 {
        h.heartbeat();
    }
    assert_eq!(h.state().consecutive_heartbeats, 144);
    assert_eq!(h.transport().count(Endpoint::Egg), 1);
}

// ── Arena ─────────────────────────────────────────────────────

#[test]
fn link_drop_mid_arena_tick_returns_to_idle() {
    let mut h = Harness::new();
    assert_eq!(
        h.command(AppCommand::SetGameMode(GameMode::Arena)),
        CommandOutcome::Applied
    );
    let link = h.link.clone();
    h.transport().drop_link_on_arena = Some(link);

    h.tick_at(5_000);

    assert_eq!(h.node.creature().game_mode(), GameMode::Idle);
    assert_eq!(h.transport().count(Endpoint::Arena), 1);
    assert_eq!(h.sink.count(|e| *e == AppEvent::ArenaAbandoned), 1);
    assert_eq!(
        h.store.get_i64(ns::GAME, keys::GAME_MODE),
        Some(GameMode::Idle.as_i64())
    );
}

#[test]
fn arena_tick_while_offline_sends_nothing() {
    let mut h = Harness::new();
    h.command(AppCommand::SetGameMode(GameMode::Arena));
    h.link.set(false);

    h.tick_at(5_000);

    assert_eq!(h.transport().count(Endpoint::Arena), 0);
    assert_eq!(h.node.creature().game_mode(), GameMode::Idle);
    assert_eq!(h.sink.count(|e| *e == AppEvent::ArenaAbandoned), 1);
}

#[test]
fn arena_timeout_with_link_up_stays_in_arena() {
    let mut h = Harness::new();
    h.command(AppCommand::SetGameMode(GameMode::Arena));
    h.tick_at(5_000);

    assert_eq!(h.transport().count(Endpoint::Arena), 1);
    assert_eq!(h.node.creature().game_mode(), GameMode::Arena);
    let body = h.transport().last(Endpoint::Arena).cloned().unwrap();
    assert_eq!(body["creatureId"], h.state().id.as_str());
}

#[test]
fn arena_win_credits_xp_and_counts() {
    let mut h = Harness::new();
    h.command(AppCommand::SetGameMode(GameMode::Arena));
    h.transport()
        .arena
        .push_back(ok(r#"{"won":true,"xpEarned":12,"opponentName":"Sparky"}"#));

    assert_eq!(h.command(AppCommand::Attack), CommandOutcome::Applied);

    let s = h.state();
    assert_eq!(s.combat.wins, 1);
    assert_eq!(s.total_xp, 12);
    assert_eq!(s.level, 2);
    assert!(h.sink.events.contains(&AppEvent::ArenaWon {
        opponent: "Sparky".into(),
        xp: 12
    }));
}

#[test]
fn knockout_blocks_arena_until_rested() {
    let mut h = Harness::new();
    h.command(AppCommand::SetGameMode(GameMode::Arena));
    h.transport().arena.push_back(ok(
        r#"{"won":false,"xpEarned":2,"damageTaken":500,"opponentName":"Grubble"}"#,
    ));

    assert_eq!(h.command(AppCommand::Attack), CommandOutcome::Applied);
    assert_eq!(h.state().combat.hp, 0);
    assert_eq!(h.state().combat.losses, 1);
    assert_eq!(h.node.creature().game_mode(), GameMode::Idle);
    assert_eq!(h.sink.count(|e| *e == AppEvent::KnockedOut), 1);

    assert_eq!(
        h.command(AppCommand::SetGameMode(GameMode::Arena)),
        CommandOutcome::Ignored
    );
    assert_eq!(h.node.creature().game_mode(), GameMode::Idle);

    assert_eq!(h.command(AppCommand::Rest), CommandOutcome::Applied);
    assert_eq!(h.state().combat.hp, 30);
    assert_eq!(
        h.command(AppCommand::SetGameMode(GameMode::Arena)),
        CommandOutcome::Applied
    );
}

#[test]
fn gated_arena_waits_a_full_interval() {
    let mut h = Harness::new();
    h.tick_at(0);
    h.tick_at(5_000);
    assert_eq!(h.transport().count(Endpoint::Arena), 0);

    h.now = 6_999;
    h.command(AppCommand::SetGameMode(GameMode::Arena));
    h.tick_at(9_999);
    assert_eq!(h.transport().count(Endpoint::Arena), 0);
    h.tick_at(10_000);
    assert_eq!(h.transport().count(Endpoint::Arena), 1);
}

#[test]
fn server_arena_commands_switch_mode() {
    let mut h = Harness::new();
    h.transport().heartbeat.push_back(ok(
        r#"{"success":true,"xpEarned":1,"gameCommand":"arena_start"}"#,
    ));
    h.heartbeat();
    assert_eq!(h.node.creature().game_mode(), GameMode::Arena);
    assert!(h.sink.events.contains(&AppEvent::GameModeChanged {
        from: GameMode::Idle,
        to: GameMode::Arena
    }));

    h.transport().heartbeat.push_back(ok(
        r#"{"success":true,"xpEarned":1,"gameCommand":"arena_stop"}"#,
    ));
    h.heartbeat();
    assert_eq!(h.node.creature().game_mode(), GameMode::Idle);
}

// ── Evolution ─────────────────────────────────────────────────

fn preloaded_juvenile() -> NvsStore {
    let mut store = NvsStore::new();
    let mut state = CreatureState::fresh("cr_juvenile0001", "Mohn", Element::Aqua);
    state.stage = Stage::Juvenile;
    state.level = 10;
    state.total_xp = 600;
    record::save(&mut store, &state).unwrap();
    store
}

#[test]
fn nano_pod_defers_adult_evolution() {
    let mut h = Harness::boot(
        NodeConfig::default(),
        DeviceCapabilities::nano_pod(),
        preloaded_juvenile(),
        1,
    );
    assert!(matches!(
        h.sink.events[0],
        AppEvent::Started {
            hatched: false,
            stage: Stage::Juvenile,
            ..
        }
    ));

    for _ in 0..3 {
        h.heartbeat();
    }

    assert_eq!(h.state().stage, Stage::Juvenile);
    assert_eq!(h.state().total_xp, 603);
    assert_eq!(
        h.sink.count(|e| *e == AppEvent::EvolutionDeferred { next: Stage::Adult }),
        3
    );
    assert!(h.node.creature().should_evolve());
    assert!(!h.node.creature().can_evolve_on_this_device());
}

#[test]
fn server_evolve_is_evaluated_once_per_heartbeat() {
    let mut h = Harness::boot(
        NodeConfig::default(),
        DeviceCapabilities::nano_pod(),
        preloaded_juvenile(),
        1,
    );
    h.transport()
        .heartbeat
        .push_back(ok(r#"{"success":true,"xpEarned":1,"gameCommand":"evolve"}"#));
    h.heartbeat();

    assert_eq!(h.state().stage, Stage::Juvenile);
    assert_eq!(
        h.sink.count(|e| *e == AppEvent::EvolutionDeferred { next: Stage::Adult }),
        1
    );
    assert!(h.sink.events.contains(&AppEvent::CommandApplied(GameCommand::Evolve)));
}

#[test]
fn small_tank_evolves_to_adult() {
    let mut h = Harness::boot(
        NodeConfig::default(),
        DeviceCapabilities::small_tank(),
        preloaded_juvenile(),
        1,
    );
    h.heartbeat();

    assert_eq!(h.state().stage, Stage::Adult);
    assert!(h.sink.events.contains(&AppEvent::Evolved { stage: Stage::Adult }));
}

#[test]
fn egg_hatches_into_baby_at_level_two() {
    let mut h = Harness::new();
    h.transport()
        .heartbeat
        .push_back(ok(r#"{"success":true,"xpEarned":10}"#));
    h.heartbeat();

    let s = h.state();
    assert_eq!(s.level, 2);
    assert_eq!(s.stage, Stage::Baby);
    assert_eq!(s.combat.max_hp, 125);
    assert_eq!(s.combat.hp, 125);
    assert!(h.sink.events.contains(&AppEvent::LevelUp { level: 2 }));
    assert!(h.sink.events.contains(&AppEvent::Evolved { stage: Stage::Baby }));
}

// ── Mood ──────────────────────────────────────────────────────

#[test]
fn mood_decays_over_an_hour() {
    let mut h = Harness::new();
    let mut t = 0;
    while t <= 3_600_000 {
        h.tick_at(t);
        t += 60_000;
    }
    let mood = h.state().mood;
    assert_eq!(mood.hunger, 76);
    assert_eq!(mood.happiness, 77);
    assert_eq!(mood.energy, 78);
}

#[test]
fn local_care_actions_raise_mood() {
    let mut h = Harness::new();
    h.command(AppCommand::Feed);
    h.command(AppCommand::Play);
    let mood = h.state().mood;
    assert_eq!(mood.hunger, 95);
    assert_eq!(mood.happiness, 100);
    assert_eq!(h.store.get_i64(ns::GAME, keys::HUNGER), Some(95));
}

// ── Persistence and reset ─────────────────────────────────────

#[test]
fn storage_failure_does_not_stop_play() {
    let mut h = Harness::new();
    h.store.set_fail_writes(true);
    for _ in 0..3 {
        h.heartbeat();
    }
    h.command(AppCommand::Feed);

    assert_eq!(h.state().total_xp, 3);
    assert_eq!(h.state().heartbeats, 3);
    assert_eq!(h.store.get_i64(ns::GAME, keys::TOTAL_XP), Some(0));
}

#[test]
fn factory_reset_clears_everything() {
    let mut h = Harness::new();
    h.store.put_str(ns::WIFI, "ssid", "home").unwrap();
    h.heartbeat();
    let old_id = h.state().id.clone();

    assert_eq!(
        h.command(AppCommand::FactoryReset),
        CommandOutcome::RestartRequired
    );
    assert_eq!(h.sink.count(|e| *e == AppEvent::FactoryReset), 1);
    for namespace in ns::ALL {
        assert_eq!(h.store.key_count(namespace), 0, "{namespace} not cleared");
    }

    let h = h.reboot(99);
    match &h.sink.events[0] {
        AppEvent::Started {
            creature_id,
            hatched,
            stage,
            ..
        } => {
            assert!(*hatched);
            assert_eq!(*stage, Stage::Egg);
            assert_ne!(creature_id.as_str(), old_id.as_str());
        }
        other => panic!("expected Started, got {other:?}"),
    }
    assert_eq!(h.state().total_xp, 0);
}
