//! Application core: pure domain logic, zero I/O.
//!
//! This module contains the orchestration for a MohnNode: heartbeat and
//! arena cycles, egg checks, auto-save, and local input handling.  All
//! interaction with storage, network, and hardware happens through **port
//! traits** defined in [`ports`], keeping this layer fully testable without
//! real peripherals.

pub mod commands;
pub mod events;
pub mod ports;
pub mod service;
