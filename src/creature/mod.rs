//! Creature lifecycle state machine.
//!
//! ```text
//!   EGG ──▶ BABY ──▶ JUVENILE ──▶ ADULT ──▶ MYTHIC
//!        evolve()   (level + XP gate  AND  device tier gate)
//!
//!   gameMode:  IDLE ──▶ HIBERNATION ──▶ ARENA ──▶ IDLE
//!                          (cycle_game_mode)
//! ```
//!
//! [`Creature`] owns the persistent [`CreatureState`] plus the injected game
//! balance.  Every mutator keeps the record inside its invariants; nothing
//! here performs I/O.

pub mod mood;
pub mod progression;
pub mod store;

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::capabilities::CapabilityTier;
use crate::error::{ArenaError, EvolveError};
use crate::identity::truncated;

pub use mood::{MOOD_MAX, Mood, MoodDecay, MoodTuning};
pub use progression::{Progression, StageRequirement};

pub type CreatureId = heapless::String<16>;
pub type CreatureName = heapless::String<24>;

/// Hit points granted on top of the previous maximum by each evolution.
pub const EVOLVE_HP_BONUS: u16 = 25;

const FRESH_MOOD: u8 = 80;
const FRESH_HP: u16 = 100;

// ───────────────────────────────────────────────────────────────
// Enumerations
// ───────────────────────────────────────────────────────────────

/// Evolution stage; order is the evolution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Stage {
    Egg,
    Baby,
    Juvenile,
    Adult,
    Mythic,
}

impl Stage {
    pub const ALL: [Stage; 5] = [Self::Egg, Self::Baby, Self::Juvenile, Self::Adult, Self::Mythic];

    pub const fn next(self) -> Option<Self> {
        match self {
            Self::Egg => Some(Self::Baby),
            Self::Baby => Some(Self::Juvenile),
            Self::Juvenile => Some(Self::Adult),
            Self::Adult => Some(Self::Mythic),
            Self::Mythic => None,
        }
    }

    pub const fn as_i64(self) -> i64 {
        self as i64
    }

    pub fn from_i64(v: i64) -> Option<Self> {
        Self::ALL.iter().copied().find(|s| s.as_i64() == v)
    }
}

/// Game mode; the integer values are part of the wire protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameMode {
    Idle,
    /// Passive XP on each acknowledged heartbeat.
    Hibernation,
    /// Periodic battles against remote opponents.
    Arena,
}

impl GameMode {
    pub const fn as_i64(self) -> i64 {
        match self {
            Self::Idle => 0,
            Self::Hibernation => 1,
            Self::Arena => 2,
        }
    }

    pub const fn from_i64(v: i64) -> Option<Self> {
        match v {
            0 => Some(Self::Idle),
            1 => Some(Self::Hibernation),
            2 => Some(Self::Arena),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Element {
    Flame,
    Aqua,
    Terra,
    Volt,
    Shadow,
}

impl Element {
    pub const ALL: [Element; 5] = [Self::Flame, Self::Aqua, Self::Terra, Self::Volt, Self::Shadow];

    pub const fn as_i64(self) -> i64 {
        self as i64
    }

    pub fn from_i64(v: i64) -> Option<Self> {
        Self::ALL.iter().copied().find(|e| e.as_i64() == v)
    }
}

/// Presentation intent; never persisted, never affects game rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VisualState {
    Idle,
    Eating,
    Happy,
    Sleeping,
    Celebrating,
    Hurt,
    Evolving,
}

// ───────────────────────────────────────────────────────────────
// Persistent record
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Combat {
    pub hp: u16,
    pub max_hp: u16,
    pub wins: u32,
    pub losses: u32,
}

/// The persisted creature record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatureState {
    pub id: CreatureId,
    pub name: CreatureName,
    pub element: Element,
    pub level: u8,
    pub stage: Stage,
    pub total_xp: u32,
    pub heartbeats: u32,
    pub consecutive_heartbeats: u32,
    pub mood: Mood,
    pub combat: Combat,
    pub game_mode: GameMode,
}

impl CreatureState {
    /// A freshly hatched record: stage Egg, level 1, all counters zero.
    pub fn fresh(id: &str, name: &str, element: Element) -> Self {
        Self {
            id: truncated(id),
            name: truncated(name),
            element,
            level: 1,
            stage: Stage::Egg,
            total_xp: 0,
            heartbeats: 0,
            consecutive_heartbeats: 0,
            mood: Mood {
                hunger: FRESH_MOOD,
                happiness: FRESH_MOOD,
                energy: FRESH_MOOD,
            },
            combat: Combat {
                hp: FRESH_HP,
                max_hp: FRESH_HP,
                wins: 0,
                losses: 0,
            },
            game_mode: GameMode::Idle,
        }
    }

    /// Pull every field back inside its invariant (used after loading).
    pub fn clamp_invariants(&mut self) {
        self.level = self.level.max(1);
        self.combat.max_hp = self.combat.max_hp.max(1);
        self.combat.hp = self.combat.hp.min(self.combat.max_hp);
        self.mood.clamp();
        if self.combat.hp == 0 && self.game_mode == GameMode::Arena {
            self.game_mode = GameMode::Idle;
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Rules injected into the state machine
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatureRules {
    pub progression: Progression,
    pub mood: MoodTuning,
    pub tier: CapabilityTier,
    pub visual_hold_ms: u64,
}

/// Result of a battle or damage application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DamageOutcome {
    pub hp: u16,
    /// hp reached zero; an arena creature is dropped back to Idle.
    pub knocked_out: bool,
}

// ───────────────────────────────────────────────────────────────
// Creature
// ───────────────────────────────────────────────────────────────

pub struct Creature {
    state: CreatureState,
    rules: CreatureRules,
    decay: MoodDecay,
    visual: VisualState,
    visual_since_ms: u64,
}

impl Creature {
    pub fn new(mut state: CreatureState, rules: CreatureRules) -> Self {
        state.clamp_invariants();
        Self {
            state,
            rules,
            decay: MoodDecay::default(),
            visual: VisualState::Idle,
            visual_since_ms: 0,
        }
    }

    pub fn state(&self) -> &CreatureState {
        &self.state
    }

    pub fn rules(&self) -> &CreatureRules {
        &self.rules
    }

    pub fn game_mode(&self) -> GameMode {
        self.state.game_mode
    }

    // ── Heartbeats and XP ─────────────────────────────────────

    /// Count one heartbeat cycle (lifetime and consecutive).
    pub fn add_heartbeat(&mut self) {
        self.state.heartbeats = self.state.heartbeats.saturating_add(1);
        self.state.consecutive_heartbeats = self.state.consecutive_heartbeats.saturating_add(1);
    }

    pub fn reset_consecutive(&mut self) {
        self.state.consecutive_heartbeats = 0;
    }

    /// Add XP; returns the new level when a threshold was crossed.
    pub fn add_xp(&mut self, xp: u32) -> Option<u8> {
        self.state.total_xp = self.state.total_xp.saturating_add(xp);
        let reached = self.rules.progression.level_for_xp(self.state.total_xp);
        if reached > self.state.level {
            self.state.level = reached;
            info!("Creature: level up → {}", reached);
            Some(reached)
        } else {
            None
        }
    }

    // ── Evolution ─────────────────────────────────────────────

    fn next_requirement(&self) -> Option<&StageRequirement> {
        self.state
            .stage
            .next()
            .and_then(|next| self.rules.progression.requirement_for(next))
    }

    /// Level/XP criteria for the next stage are met.
    pub fn should_evolve(&self) -> bool {
        self.next_requirement().is_some_and(|req| {
            self.state.level >= req.min_level && self.state.total_xp >= req.min_xp
        })
    }

    /// This device's tier can host the next stage.
    pub fn can_evolve_on_this_device(&self) -> bool {
        self.next_requirement()
            .is_some_and(|req| self.rules.tier >= req.min_tier)
    }

    /// Advance one stage.  Refused unless both gates pass.
    pub fn evolve(&mut self) -> Result<Stage, EvolveError> {
        let Some(next) = self.state.stage.next() else {
            return Err(EvolveError::FinalStage);
        };
        if !self.should_evolve() {
            return Err(EvolveError::NotReady);
        }
        if !self.can_evolve_on_this_device() {
            warn!("Creature: {:?} needs a bigger aquarium", next);
            return Err(EvolveError::DeviceTooSmall);
        }
        self.state.stage = next;
        self.state.combat.max_hp = self.state.combat.max_hp.saturating_add(EVOLVE_HP_BONUS);
        self.state.combat.hp = self.state.combat.max_hp;
        info!("Creature: evolved to {:?}", next);
        Ok(next)
    }

    // ── Care actions ──────────────────────────────────────────

    pub fn feed(&mut self, amount: u8) {
        self.state.mood.hunger = Mood::raise(self.state.mood.hunger, amount);
    }

    pub fn play(&mut self, amount: u8) {
        self.state.mood.happiness = Mood::raise(self.state.mood.happiness, amount);
    }

    /// Restores energy and the same number of hit points.
    pub fn rest(&mut self, amount: u8) {
        self.state.mood.energy = Mood::raise(self.state.mood.energy, amount);
        let combat = &mut self.state.combat;
        combat.hp = combat.hp.saturating_add(amount as u16).min(combat.max_hp);
    }

    /// Apply elapsed wall-clock time to the mood dimensions.
    pub fn decay(&mut self, elapsed_ms: u64) {
        self.decay
            .apply(&mut self.state.mood, &self.rules.mood, elapsed_ms);
    }

    // ── Combat ────────────────────────────────────────────────

    pub fn record_win(&mut self, xp: u32) -> Option<u8> {
        self.state.combat.wins = self.state.combat.wins.saturating_add(1);
        self.add_xp(xp)
    }

    pub fn record_loss(&mut self, xp: u32) -> Option<u8> {
        self.state.combat.losses = self.state.combat.losses.saturating_add(1);
        self.add_xp(xp)
    }

    pub fn take_damage(&mut self, damage: u16) -> DamageOutcome {
        let combat = &mut self.state.combat;
        combat.hp = combat.hp.saturating_sub(damage);
        let knocked_out = combat.hp == 0;
        if knocked_out && self.state.game_mode == GameMode::Arena {
            warn!("Creature: knocked out, leaving arena");
            self.state.game_mode = GameMode::Idle;
        }
        DamageOutcome {
            hp: self.state.combat.hp,
            knocked_out,
        }
    }

    pub fn is_knocked_out(&self) -> bool {
        self.state.combat.hp == 0
    }

    // ── Game mode ─────────────────────────────────────────────

    /// Switch mode; returns the previous mode.
    pub fn set_game_mode(&mut self, mode: GameMode) -> Result<GameMode, ArenaError> {
        if mode == GameMode::Arena && self.is_knocked_out() {
            return Err(ArenaError::KnockedOut);
        }
        let previous = self.state.game_mode;
        self.state.game_mode = mode;
        Ok(previous)
    }

    /// Idle → Hibernation → Arena → Idle; skips Arena while knocked out.
    pub fn cycle_game_mode(&mut self) -> GameMode {
        let next = match self.state.game_mode {
            GameMode::Idle => GameMode::Hibernation,
            GameMode::Hibernation if self.is_knocked_out() => GameMode::Idle,
            GameMode::Hibernation => GameMode::Arena,
            GameMode::Arena => GameMode::Idle,
        };
        self.state.game_mode = next;
        next
    }

    // ── Presentation ──────────────────────────────────────────

    pub fn set_state(&mut self, visual: VisualState, now_ms: u64) {
        self.visual = visual;
        self.visual_since_ms = now_ms;
    }

    pub fn visual_state(&self, now_ms: u64) -> VisualState {
        if now_ms.saturating_sub(self.visual_since_ms) < self.rules.visual_hold_ms {
            self.visual
        } else if self.state.game_mode == GameMode::Hibernation {
            VisualState::Sleeping
        } else {
            VisualState::Idle
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NodeConfig;

    fn creature_on(tier: CapabilityTier) -> Creature {
        let mut rules = NodeConfig::default().creature_rules();
        rules.tier = tier;
        Creature::new(CreatureState::fresh("cr_test", "Mohn", Element::Aqua), rules)
    }

    #[test]
    fn fresh_creature_is_an_egg_at_level_one() {
        let c = creature_on(CapabilityTier::Nano);
        assert_eq!(c.state().stage, Stage::Egg);
        assert_eq!(c.state().level, 1);
        assert_eq!(c.state().total_xp, 0);
        assert_eq!(c.game_mode(), GameMode::Idle);
    }

    #[test]
    fn add_xp_crosses_thresholds() {
        let mut c = creature_on(CapabilityTier::Nano);
        assert_eq!(c.add_xp(5), None);
        assert_eq!(c.add_xp(5), Some(2));
        assert_eq!(c.state().total_xp, 10);
    }

    #[test]
    fn evolve_refused_until_ready() {
        let mut c = creature_on(CapabilityTier::Nano);
        assert_eq!(c.evolve(), Err(EvolveError::NotReady));
        c.add_xp(10);
        assert!(c.should_evolve());
        assert_eq!(c.evolve(), Ok(Stage::Baby));
        assert_eq!(c.state().combat.max_hp, 100 + EVOLVE_HP_BONUS);
        assert_eq!(c.state().combat.hp, c.state().combat.max_hp);
    }

    #[test]
    fn small_device_defers_large_stage() {
        let mut c = creature_on(CapabilityTier::Nano);
        c.add_xp(10);
        c.evolve().unwrap();
        c.add_xp(600);
        c.evolve().unwrap();
        assert_eq!(c.state().stage, Stage::Juvenile);
        // Adult needs a SmallTank.
        assert!(c.should_evolve());
        assert!(!c.can_evolve_on_this_device());
        assert_eq!(c.evolve(), Err(EvolveError::DeviceTooSmall));
        assert_eq!(c.state().stage, Stage::Juvenile);
    }

    #[test]
    fn final_stage_cannot_evolve() {
        let mut c = creature_on(CapabilityTier::Aquarium);
        c.add_xp(1_000_000);
        for _ in 0..4 {
            c.evolve().unwrap();
        }
        assert_eq!(c.state().stage, Stage::Mythic);
        assert!(!c.should_evolve());
        assert_eq!(c.evolve(), Err(EvolveError::FinalStage));
    }

    #[test]
    fn care_actions_saturate_at_max() {
        let mut c = creature_on(CapabilityTier::Nano);
        c.feed(200);
        c.play(30);
        assert_eq!(c.state().mood.hunger, MOOD_MAX);
        assert_eq!(c.state().mood.happiness, MOOD_MAX);
    }

    #[test]
    fn knockout_drops_arena_and_blocks_reentry() {
        let mut c = creature_on(CapabilityTier::Nano);
        c.set_game_mode(GameMode::Arena).unwrap();
        let out = c.take_damage(500);
        assert!(out.knocked_out);
        assert_eq!(out.hp, 0);
        assert_eq!(c.game_mode(), GameMode::Idle);
        assert_eq!(c.set_game_mode(GameMode::Arena), Err(ArenaError::KnockedOut));

        c.rest(30);
        assert_eq!(c.state().combat.hp, 30);
        assert_eq!(c.set_game_mode(GameMode::Arena), Ok(GameMode::Idle));
    }

    #[test]
    fn cycle_visits_every_mode() {
        let mut c = creature_on(CapabilityTier::Nano);
        assert_eq!(c.cycle_game_mode(), GameMode::Hibernation);
        assert_eq!(c.cycle_game_mode(), GameMode::Arena);
        assert_eq!(c.cycle_game_mode(), GameMode::Idle);
    }

    #[test]
    fn cycle_skips_arena_when_knocked_out() {
        let mut c = creature_on(CapabilityTier::Nano);
        c.take_damage(u16::MAX);
        assert_eq!(c.cycle_game_mode(), GameMode::Hibernation);
        assert_eq!(c.cycle_game_mode(), GameMode::Idle);
    }

    #[test]
    fn win_and_loss_update_counters_and_xp() {
        let mut c = creature_on(CapabilityTier::Nano);
        c.record_win(12);
        c.record_loss(3);
        assert_eq!(c.state().combat.wins, 1);
        assert_eq!(c.state().combat.losses, 1);
        assert_eq!(c.state().total_xp, 15);
    }

    #[test]
    fn visual_state_expires_after_hold() {
        let mut c = creature_on(CapabilityTier::Nano);
        let hold = c.rules().visual_hold_ms;
        c.set_state(VisualState::Eating, 1_000);
        assert_eq!(c.visual_state(1_000 + hold - 1), VisualState::Eating);
        assert_eq!(c.visual_state(1_000 + hold), VisualState::Idle);
    }

    #[test]
    fn loaded_record_is_clamped() {
        let mut state = CreatureState::fresh("cr_x", "X", Element::Volt);
        state.level = 0;
        state.combat.hp = 900;
        state.mood.energy = 250;
        let c = Creature::new(state, NodeConfig::default().creature_rules());
        assert_eq!(c.state().level, 1);
        assert_eq!(c.state().combat.hp, c.state().combat.max_hp);
        assert_eq!(c.state().mood.energy, MOOD_MAX);
    }
}
