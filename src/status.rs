//! Status signal: what the status LED should show.
//!
//! A derived state machine with no logic of its own.  Recomputed every tick
//! from connectivity, the last heartbeat outcome, and the game mode:
//!
//! ```text
//!   disabled ─────────────────────────────▶ Off
//!   within ack window of a good heartbeat ─▶ AckBlink   (overrides all below)
//!   link down  OR  last heartbeat failed ──▶ Error
//!   no heartbeat yet ──────────────────────▶ Solid
//!   Hibernation ───────────────────────────▶ ActivePulse
//!   Arena ─────────────────────────────────▶ ConflictFlash
//!   Idle ──────────────────────────────────▶ IdlePulse
//! ```
//!
//! Nothing here is persisted.  The rendering of each pattern over time is
//! in [`crate::drivers::led_patterns`].

use crate::creature::GameMode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusPattern {
    Off,
    IdlePulse,
    ActivePulse,
    ConflictFlash,
    Solid,
    Error,
    AckBlink,
}

#[derive(Debug, Clone)]
pub struct StatusSignal {
    enabled: bool,
    ack_window_ms: u64,
    ack_started_ms: Option<u64>,
    last_heartbeat_ok: Option<bool>,
    current: StatusPattern,
}

impl StatusSignal {
    pub fn new(enabled: bool, ack_window_ms: u64) -> Self {
        Self {
            enabled,
            ack_window_ms,
            ack_started_ms: None,
            last_heartbeat_ok: None,
            current: if enabled { StatusPattern::Solid } else { StatusPattern::Off },
        }
    }

    /// Start the ACK window (successful heartbeat).
    pub fn acknowledge(&mut self, now_ms: u64) {
        self.ack_started_ms = Some(now_ms);
    }

    pub fn record_heartbeat(&mut self, ok: bool) {
        self.last_heartbeat_ok = Some(ok);
        if !ok {
            self.ack_started_ms = None;
        }
    }

    /// Re-derive the pattern.
    pub fn update(&mut self, now_ms: u64, connected: bool, mode: GameMode) -> StatusPattern {
        let in_ack = self
            .ack_started_ms
            .is_some_and(|t| now_ms.saturating_sub(t) < self.ack_window_ms);

        self.current = if !self.enabled {
            StatusPattern::Off
        } else if in_ack {
            StatusPattern::AckBlink
        } else if !connected || self.last_heartbeat_ok == Some(false) {
            StatusPattern::Error
        } else if self.last_heartbeat_ok.is_none() {
            StatusPattern::Solid
        } else {
            match mode {
                GameMode::Idle => StatusPattern::IdlePulse,
                GameMode::Hibernation => StatusPattern::ActivePulse,
                GameMode::Arena => StatusPattern::ConflictFlash,
            }
        };
        self.current
    }

    /// Pattern from the last [`update`](Self::update).
    pub fn current(&self) -> StatusPattern {
        self.current
    }
}
