//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ NodeService (domain)
//! ```
//!
//! Driven adapters (NVS, WiFi, GPS, event sinks) implement these traits.
//! The [`NodeService`](super::service::NodeService) consumes them via
//! generics, so the domain core never touches hardware directly.

use crate::error::StorageError;
use crate::scheduler::TaskId;

/// Persistence namespaces.  Names and keys are limited to 15 characters.
pub mod ns {
    /// Node identity and config.
    pub const NODE: &str = "mohnnode";
    /// Creature record.
    pub const GAME: &str = "mohngame";
    /// WiFi credentials.
    pub const WIFI: &str = "wifi";

    /// Every namespace wiped by a factory reset.
    pub const ALL: [&str; 3] = [NODE, GAME, WIFI];
}

// ───────────────────────────────────────────────────────────────
// Persistence port (driven adapter: domain ↔ NVS / flash)
// ───────────────────────────────────────────────────────────────

/// Namespaced key-value storage for string and integer scalars.
///
/// Writes are atomic per key.  Reads never fail: an absent or unreadable
/// key is `None`, and the `*_or` helpers substitute the caller's default.
pub trait PersistencePort {
    fn get_str(&self, namespace: &str, key: &str) -> Option<String>;

    fn get_i64(&self, namespace: &str, key: &str) -> Option<i64>;

    fn put_str(&mut self, namespace: &str, key: &str, value: &str) -> Result<(), StorageError>;

    fn put_i64(&mut self, namespace: &str, key: &str, value: i64) -> Result<(), StorageError>;

    /// Erase every key in `namespace`.  Clearing an empty namespace is `Ok`.
    fn clear(&mut self, namespace: &str) -> Result<(), StorageError>;

    fn str_or(&self, namespace: &str, key: &str, default: &str) -> String {
        self.get_str(namespace, key)
            .unwrap_or_else(|| default.to_owned())
    }

    fn i64_or(&self, namespace: &str, key: &str, default: i64) -> i64 {
        self.get_i64(namespace, key).unwrap_or(default)
    }
}

// ───────────────────────────────────────────────────────────────
// Connectivity port (driven adapter: WiFi → domain)
// ───────────────────────────────────────────────────────────────

/// Link state as seen by the domain.  Reconnection policy lives in the
/// adapter; the core only asks whether requests can be attempted.
pub trait ConnectivityPort {
    fn is_connected(&self) -> bool;

    /// Received signal strength in dBm; `None` while disconnected.
    fn signal_strength(&self) -> Option<i8>;
}

// ───────────────────────────────────────────────────────────────
// Location (optional capability)
// ───────────────────────────────────────────────────────────────

/// A GPS position fix in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoFix {
    pub lat: f64,
    pub lon: f64,
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → log / display / BLE)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go (serial log, display
/// toast, BLE notification).
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Scheduler delegate (decouples scheduler from the service)
// ───────────────────────────────────────────────────────────────

/// Callback trait the [`Scheduler`](crate::scheduler::Scheduler) uses to
/// ask whether a due task may run and to hand it off.
pub trait SchedulerDelegate {
    /// Gate for a due task.  A closed gate skips the run; the task's timer
    /// still advances.
    fn is_enabled(&self, task: TaskId) -> bool;

    /// Called for each due task whose gate is open.
    fn on_task_due(&mut self, task: TaskId, now_ms: u64);
}
