//! Host-side integration tests for the node service.
//!
//! Run with `cargo test --test integration`.  The service is booted against
//! the in-memory [`NvsStore`](mohnnode::adapters::nvs::NvsStore), a
//! scripted HTTP transport and a switchable link; time is driven manually.
#![cfg(not(target_os = "espidf"))]

mod harness;
mod mock_ports;
mod persistence_tests;
mod service_tests;
