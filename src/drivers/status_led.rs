//! Single-colour status LED driver.
//!
//! Generic over any `embedded_hal::digital::OutputPin`: an
//! `esp_idf_hal::gpio::PinDriver` on target, a mock pin in tests.  Writes
//! only on level changes.

use embedded_hal::digital::OutputPin;
use log::warn;

pub struct StatusLed<P: OutputPin> {
    pin: P,
    /// LED lights when the pin is driven low.
    active_low: bool,
    lit: Option<bool>,
}

impl<P: OutputPin> StatusLed<P> {
    pub fn new(pin: P, active_low: bool) -> Self {
        Self {
            pin,
            active_low,
            lit: None,
        }
    }

    pub fn set(&mut self, on: bool) {
        if self.lit == Some(on) {
            return;
        }
        let high = on != self.active_low;
        let res = if high {
            self.pin.set_high()
        } else {
            self.pin.set_low()
        };
        match res {
            Ok(()) => self.lit = Some(on),
            Err(_) => warn!("StatusLed: pin write failed"),
        }
    }

    pub fn off(&mut self) {
        self.set(false);
    }

    pub fn is_lit(&self) -> bool {
        self.lit == Some(true)
    }
}
