//! Outbound application events.
//!
//! The [`NodeService`](super::service::NodeService) emits these through the
//! [`EventSink`](super::ports::EventSink) port.  Adapters on the other
//! side decide what to do with them: log to serial, show a toast on a
//! display, notify over BLE.

use crate::creature::{GameMode, Stage};
use crate::protocol::GameCommand;

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    /// The service has booted (carries the loaded or hatched creature).
    Started {
        creature_id: String,
        stage: Stage,
        level: u8,
        /// No record was stored; a new egg was created.
        hatched: bool,
    },

    HeartbeatAcked { xp_earned: u32, total_xp: u32 },

    /// Transport or protocol failure; the consecutive streak was reset.
    HeartbeatFailed,

    /// A server-issued command was applied.
    CommandApplied(GameCommand),

    LevelUp { level: u8 },

    Evolved { stage: Stage },

    /// Ready to evolve, but this device's tier cannot host `next`.
    EvolutionDeferred { next: Stage },

    ArenaWon { opponent: String, xp: u32 },

    ArenaLost { opponent: String, xp: u32, damage: u16 },

    /// hp reached zero; arena eligibility is lost until healed.
    KnockedOut,

    /// The link dropped during an arena tick; the creature left the arena.
    ArenaAbandoned,

    /// A new collectible egg.  Emitted exactly once per award.
    EggAwarded { egg_id: String, egg_type: String },

    GameModeChanged { from: GameMode, to: GameMode },

    /// Persistence was wiped; a restart is pending.
    FactoryReset,
}

impl AppEvent {
    /// Short user-facing message, for outputs that can show one.
    pub fn toast(&self) -> Option<String> {
        let text = match self {
            Self::HeartbeatAcked { xp_earned, .. } => format!("Heartbeat! +{xp_earned} XP"),
            Self::HeartbeatFailed => "Offline".into(),
            Self::LevelUp { level } => format!("Level up! Lv {level}"),
            Self::Evolved { stage } => format!("Evolved into {stage:?}!"),
            Self::EvolutionDeferred { .. } => "Needs bigger aquarium!".into(),
            Self::ArenaWon { opponent, xp } => format!("Beat {opponent}! +{xp} XP"),
            Self::ArenaLost { opponent, damage, .. } => format!("Lost to {opponent} (-{damage} HP)"),
            Self::KnockedOut => "Knocked out!".into(),
            Self::ArenaAbandoned => "Left arena: offline".into(),
            Self::EggAwarded { .. } => "New egg found!".into(),
            Self::GameModeChanged { to, .. } => format!("Mode: {to:?}"),
            Self::FactoryReset => "Factory reset".into(),
            Self::Started { .. } | Self::CommandApplied(_) => return None,
        };
        Some(text)
    }
}
