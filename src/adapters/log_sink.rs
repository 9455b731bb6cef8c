//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the ESP-IDF logger (which goes to UART / USB-CDC in production).
//! A display or BLE adapter would implement the same trait and use
//! [`AppEvent::toast`] for its text.

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the serial console.
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl Default for LogEventSink {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Started {
                creature_id,
                stage,
                level,
                hatched,
            } => {
                info!(
                    "START | creature={} stage={:?} level={} hatched={}",
                    creature_id, stage, level, hatched
                );
            }
            AppEvent::HeartbeatAcked {
                xp_earned,
                total_xp,
            } => {
                info!("HB    | ack +{} XP (total {})", xp_earned, total_xp);
            }
            AppEvent::HeartbeatFailed => {
                warn!("HB    | failed, streak reset");
            }
            AppEvent::CommandApplied(cmd) => {
                info!("CMD   | {}", cmd.as_str());
            }
            AppEvent::LevelUp { level } => {
                info!("LEVEL | {}", level);
            }
            AppEvent::Evolved { stage } => {
                info!("EVOLVE| -> {:?}", stage);
            }
            AppEvent::EvolutionDeferred { next } => {
                info!("EVOLVE| {:?} deferred: device tier too small", next);
            }
            AppEvent::ArenaWon { opponent, xp } => {
                info!("ARENA | won vs {} (+{} XP)", opponent, xp);
            }
            AppEvent::ArenaLost {
                opponent,
                xp,
                damage,
            } => {
                info!("ARENA | lost vs {} (+{} XP, -{} HP)", opponent, xp, damage);
            }
            AppEvent::KnockedOut => {
                warn!("ARENA | knocked out");
            }
            AppEvent::ArenaAbandoned => {
                warn!("ARENA | abandoned, link lost");
            }
            AppEvent::EggAwarded { egg_id, egg_type } => {
                info!("EGG   | id={} type={}", egg_id, egg_type);
            }
            AppEvent::GameModeChanged { from, to } => {
                info!("MODE  | {:?} -> {:?}", from, to);
            }
            AppEvent::FactoryReset => {
                warn!("RESET | factory reset, restart pending");
            }
        }
    }
}
