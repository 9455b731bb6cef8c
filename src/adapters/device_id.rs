//! Factory MAC address and hardware entropy.
//!
//! The MAC seeds the persistent node id (see [`crate::identity`]); the
//! entropy nonce makes every freshly hatched creature id unique.

/// Full 6-byte MAC address.
pub type MacAddress = [u8; 6];

/// Read the factory MAC address from eFuse.
#[cfg(target_os = "espidf")]
pub fn read_mac() -> MacAddress {
    let mut mac: MacAddress = [0u8; 6];
    // SAFETY: `mac` is a valid 6-byte buffer.
    unsafe {
        esp_idf_svc::sys::esp_efuse_mac_get_default(mac.as_mut_ptr());
    }
    mac
}

/// Simulation: returns a deterministic fake MAC.
#[cfg(not(target_os = "espidf"))]
pub fn read_mac() -> MacAddress {
    [0xDE, 0xAD, 0xBE, 0xEF, 0xCA, 0xFE]
}

/// 64 bits from the hardware RNG (RF subsystem must be on for true entropy).
#[cfg(target_os = "espidf")]
pub fn entropy_nonce() -> u64 {
    // SAFETY: esp_random has no preconditions.
    let hi = unsafe { esp_idf_svc::sys::esp_random() } as u64;
    let lo = unsafe { esp_idf_svc::sys::esp_random() } as u64;
    (hi << 32) | lo
}

/// Simulation: wall-clock nanoseconds.
#[cfg(not(target_os = "espidf"))]
pub fn entropy_nonce() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map_or(0, |d| d.as_nanos() as u64)
}
