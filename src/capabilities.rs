//! Device capability descriptor.
//!
//! One firmware image serves every MohnNode form factor.  What a given board
//! can do (screen, radios, GPS, how large a creature it can host) is resolved
//! once at startup into a [`DeviceCapabilities`] value and consulted at
//! runtime instead of being baked in at compile time.
//!
//! ```text
//!   tier 0  Nano pod      LED only, BLE
//!   tier 1  Small tank    display, BLE, LoRa
//!   tier 2  Aquarium      display, BLE, LoRa, GPS
//! ```

use serde::{Deserialize, Serialize};

/// Hardware size class; gates how far a creature may evolve on this device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CapabilityTier {
    Nano,
    SmallTank,
    Aquarium,
}

impl CapabilityTier {
    pub const fn as_u8(self) -> u8 {
        match self {
            Self::Nano => 0,
            Self::SmallTank => 1,
            Self::Aquarium => 2,
        }
    }

    pub const fn from_u8(v: u8) -> Option<Self> {
        match v {
            0 => Some(Self::Nano),
            1 => Some(Self::SmallTank),
            2 => Some(Self::Aquarium),
            _ => None,
        }
    }
}

/// Feature flags for the running board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceCapabilities {
    pub tier: CapabilityTier,
    pub display: bool,
    pub ble: bool,
    pub gps: bool,
    pub lora: bool,
    /// Single status LED is the primary output (screenless boards).
    pub status_led: bool,
}

impl DeviceCapabilities {
    pub const fn nano_pod() -> Self {
        Self {
            tier: CapabilityTier::Nano,
            display: false,
            ble: true,
            gps: false,
            lora: false,
            status_led: true,
        }
    }

    pub const fn small_tank() -> Self {
        Self {
            tier: CapabilityTier::SmallTank,
            display: true,
            ble: true,
            gps: false,
            lora: true,
            status_led: false,
        }
    }

    pub const fn aquarium() -> Self {
        Self {
            tier: CapabilityTier::Aquarium,
            display: true,
            ble: true,
            gps: true,
            lora: true,
            status_led: false,
        }
    }

    pub const fn for_tier(tier: CapabilityTier) -> Self {
        match tier {
            CapabilityTier::Nano => Self::nano_pod(),
            CapabilityTier::SmallTank => Self::small_tank(),
            CapabilityTier::Aquarium => Self::aquarium(),
        }
    }
}
