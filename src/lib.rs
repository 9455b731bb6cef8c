//! MohnNode firmware library.
//!
//! Exposes the pure-logic modules for integration testing and external
//! inspection. All ESP-IDF-specific code is guarded by
//! `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod app;
pub mod capabilities;
pub mod config;
pub mod creature;
pub mod error;
pub mod identity;
pub mod input;
pub mod protocol;
pub mod scheduler;
pub mod status;

pub mod pins;

// Adapters and drivers compile on every target; the ESP-IDF
// implementations are selected by cfg attributes inside.
pub mod adapters;
pub mod drivers;
