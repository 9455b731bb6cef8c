//! GPIO assignments for the MohnNode nano pod (ESP32 DevKit).
//!
//! Single source of truth for pin numbers; `main` takes the matching
//! `esp_idf_hal` peripherals.  Larger boards (display, GPS, LoRa) add their
//! pins here when their drivers land.

/// Built-in status LED, active high.
pub const STATUS_LED_GPIO: i32 = 2;
pub const STATUS_LED_ACTIVE_LOW: bool = false;

/// BOOT button, active low with internal pull-up.
pub const BUTTON_GPIO: i32 = 0;
