//! LED pattern engine.
//!
//! Renders a [`StatusPattern`] into an on/off level for the single status
//! LED.  The main loop calls `tick()` each iteration with the elapsed time
//! and feeds the result into `StatusLed::set()`.  The phase restarts
//! whenever the pattern changes, so every pattern begins with its "on"
//! segment.
//!
//! ## Pattern timing
//!
//! | Pattern       | Description                          | Period  |
//! |---------------|--------------------------------------|---------|
//! | Off           | Dark                                 | -       |
//! | Solid         | Constant on                          | -       |
//! | IdlePulse     | Short blip, 15 % duty                | 3 s     |
//! | ActivePulse   | Heartbeat-like pulse, 30 % duty      | 1 s     |
//! | ConflictFlash | Fast toggle                          | 200 ms  |
//! | Error         | Three blinks, then a long pause      | 3.6 s   |
//! | AckBlink      | Fast toggle for the ACK window       | 200 ms  |

use crate::status::StatusPattern;

const IDLE_PERIOD_MS: u32 = 3_000;
const IDLE_ON_MS: u32 = IDLE_PERIOD_MS * 15 / 100;
const ACTIVE_PERIOD_MS: u32 = 1_000;
const ACTIVE_ON_MS: u32 = ACTIVE_PERIOD_MS * 30 / 100;
const TOGGLE_MS: u32 = 100;
const ERROR_SLOT_MS: u32 = 200;
/// 18 slots of 200 ms; slots 0, 2, 4 are lit.
const ERROR_SLOTS: u32 = 18;

/// LED pattern engine. Stack-allocated, no heap.
pub struct LedPatternEngine {
    phase_ms: u32,
    active: StatusPattern,
}

impl LedPatternEngine {
    pub fn new() -> Self {
        Self {
            phase_ms: 0,
            active: StatusPattern::Off,
        }
    }

    pub fn active(&self) -> StatusPattern {
        self.active
    }

    /// Advance the phase by `delta_ms` and return the LED level.
    pub fn tick(&mut self, pattern: StatusPattern, delta_ms: u32) -> bool {
        if pattern == self.active {
            self.phase_ms = self.phase_ms.wrapping_add(delta_ms);
        } else {
            self.active = pattern;
            self.phase_ms = 0;
        }
        self.level()
    }

    fn level(&self) -> bool {
        let t = self.phase_ms;
        match self.active {
            StatusPattern::Off => false,
            StatusPattern::Solid => true,
            StatusPattern::IdlePulse => t % IDLE_PERIOD_MS < IDLE_ON_MS,
            StatusPattern::ActivePulse => t % ACTIVE_PERIOD_MS < ACTIVE_ON_MS,
            StatusPattern::ConflictFlash | StatusPattern::AckBlink => (t / TOGGLE_MS) % 2 == 0,
            StatusPattern::Error => {
                let slot = (t / ERROR_SLOT_MS) % ERROR_SLOTS;
                slot < 6 && slot % 2 == 0
            }
        }
    }
}

impl Default for LedPatternEngine {
    fn default() -> Self {
        Self::new()
    }
}
