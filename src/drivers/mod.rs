//! Output drivers for the status LED.

pub mod led_patterns;
pub mod status_led;
