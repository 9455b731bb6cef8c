//! Boot-relative millisecond clock for the main loop.
//!
//! Every timestamp the node handles (scheduler, gestures, LED phase, WiFi
//! backoff, ack window) is milliseconds since boot from this adapter.  On
//! device it reads the ESP-IDF high-resolution timer; on the host it counts
//! from construction with `std::time::Instant`.

pub struct Esp32TimeAdapter {
    #[cfg(not(target_os = "espidf"))]
    origin: std::time::Instant,
}

impl Default for Esp32TimeAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl Esp32TimeAdapter {
    pub fn new() -> Self {
        Self {
            #[cfg(not(target_os = "espidf"))]
            origin: std::time::Instant::now(),
        }
    }

    /// Milliseconds since boot; never goes backwards.
    pub fn uptime_ms(&self) -> u64 {
        self.micros() / 1_000
    }

    #[cfg(target_os = "espidf")]
    fn micros(&self) -> u64 {
        // SAFETY: the IDF starts esp_timer before app_main; the call has no
        // preconditions beyond that.
        let us = unsafe { esp_idf_svc::sys::esp_timer_get_time() };
        us.max(0) as u64
    }

    #[cfg(not(target_os = "espidf"))]
    fn micros(&self) -> u64 {
        self.origin.elapsed().as_micros() as u64
    }
}
