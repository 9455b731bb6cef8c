//! Fuzz target: backend response decoders
//!
//! The first two bytes pick the HTTP status, the rest is the body.  Every
//! decoder must return `Ok` or `Err` without panicking, and an accepted
//! body must come from a 200 response.
//!
//! cargo fuzz run fuzz_response_decoder

#![no_main]

use libfuzzer_sys::fuzz_target;
use mohnnode::protocol::wire;

fuzz_target!(|data: &[u8]| {
    if data.len() < 2 {
        return;
    }
    let status = u16::from_le_bytes([data[0], data[1]]);
    let body = &data[2..];

    if wire::decode_heartbeat(status, body).is_ok() {
        assert_eq!(status, 200);
    }
    if wire::decode_arena(status, body).is_ok() {
        assert_eq!(status, 200);
    }
    if wire::decode_egg(status, body).is_ok() {
        assert_eq!(status, 200);
    }
});
