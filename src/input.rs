//! Button gesture detection and mapping to application commands.
//!
//! ## Hardware
//!
//! Active-low momentary switch with pull-up.  The main loop samples the
//! pin level every iteration and passes it to [`ButtonGestures::poll`],
//! which debounces it and runs the gesture state machine.  No ISR.
//!
//! ## Gesture detection
//!
//! | Gesture      | Condition                                    | Command           |
//! |--------------|----------------------------------------------|-------------------|
//! | Short press  | Release < 2 s, no second press within 300 ms | `Feed`            |
//! | Double press | Second press within 300 ms of first release  | `CycleGameMode`   |
//! | Long press   | Released after ≥ 2 s (and < 10 s)            | `TriggerHeartbeat`|
//! | Factory hold | Held ≥ 10 s (fires while still held)         | `FactoryReset`    |

use crate::app::commands::AppCommand;

const DEBOUNCE_MS: u64 = 30;
const DOUBLE_PRESS_WINDOW_MS: u64 = 300;
const LONG_PRESS_MS: u64 = 2_000;
const FACTORY_HOLD_MS: u64 = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gesture {
    Short,
    Double,
    Long,
    FactoryHold,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    Pressed { since_ms: u64, second: bool },
    /// Factory hold already reported; swallow the release.
    Spent,
    WaitSecondPress { released_ms: u64 },
}

pub struct ButtonGestures {
    stable: bool,
    raw: bool,
    raw_since_ms: u64,
    phase: Phase,
}

impl ButtonGestures {
    pub fn new() -> Self {
        Self {
            stable: false,
            raw: false,
            raw_since_ms: 0,
            phase: Phase::Idle,
        }
    }

    /// Feed the current (already inverted) pressed level.
    pub fn poll(&mut self, pressed: bool, now_ms: u64) -> Option<Gesture> {
        if pressed != self.raw {
            self.raw = pressed;
            self.raw_since_ms = now_ms;
        }
        let settled = now_ms.saturating_sub(self.raw_since_ms) >= DEBOUNCE_MS;
        if settled && self.raw != self.stable {
            self.stable = self.raw;
            return if self.stable {
                self.on_press(now_ms)
            } else {
                self.on_release(now_ms)
            };
        }
        self.on_steady(now_ms)
    }

    fn on_press(&mut self, now_ms: u64) -> Option<Gesture> {
        let second = matches!(
            self.phase,
            Phase::WaitSecondPress { released_ms }
                if now_ms.saturating_sub(released_ms) <= DOUBLE_PRESS_WINDOW_MS
        );
        self.phase = Phase::Pressed {
            since_ms: now_ms,
            second,
        };
        None
    }

    fn on_release(&mut self, now_ms: u64) -> Option<Gesture> {
        match self.phase {
            Phase::Pressed { since_ms, second } => {
                let held = now_ms.saturating_sub(since_ms);
                if held >= LONG_PRESS_MS {
                    self.phase = Phase::Idle;
                    Some(Gesture::Long)
                } else if second {
                    self.phase = Phase::Idle;
                    Some(Gesture::Double)
                } else {
                    self.phase = Phase::WaitSecondPress { released_ms: now_ms };
                    None
                }
            }
            _ => {
                self.phase = Phase::Idle;
                None
            }
        }
    }

    fn on_steady(&mut self, now_ms: u64) -> Option<Gesture> {
        match self.phase {
            Phase::Pressed { since_ms, .. } if now_ms.saturating_sub(since_ms) >= FACTORY_HOLD_MS => {
                self.phase = Phase::Spent;
                Some(Gesture::FactoryHold)
            }
            Phase::WaitSecondPress { released_ms }
                if now_ms.saturating_sub(released_ms) > DOUBLE_PRESS_WINDOW_MS =>
            {
                self.phase = Phase::Idle;
                Some(Gesture::Short)
            }
            _ => None,
        }
    }
}

impl Default for ButtonGestures {
    fn default() -> Self {
        Self::new()
    }
}

/// Gesture → command table.
pub struct InputMap;

impl InputMap {
    pub fn command_for(gesture: Gesture) -> AppCommand {
        match gesture {
            Gesture::Short => AppCommand::Feed,
            Gesture::Double => AppCommand::CycleGameMode,
            Gesture::Long => AppCommand::TriggerHeartbeat,
            Gesture::FactoryHold => AppCommand::FactoryReset,
        }
    }
}
