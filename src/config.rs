//! Node configuration parameters
//!
//! All tunable parameters for a MohnNode.  Stored as a JSON string under
//! `mohnnode/cfg` and validated both before saving and after loading.

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::app::ports::{PersistencePort, ns};
use crate::capabilities::CapabilityTier;
use crate::creature::{CreatureRules, MoodTuning, Progression};
use crate::error::ConfigError;

/// Persistence key of the serialized config inside the node namespace.
pub const CONFIG_KEY: &str = "cfg";

pub const HEARTBEAT_PATH: &str = "/api/node/heartbeat";
pub const ARENA_TICK_PATH: &str = "/api/node/arena-tick";
pub const CHECK_EGG_PATH: &str = "/api/node/generate-egg";

/// Core node configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    // --- Backend ---
    /// Base URL of the game backend, without trailing slash
    pub api_endpoint: String,
    /// Per-request timeout (milliseconds)
    pub http_timeout_ms: u32,

    // --- Scheduling ---
    pub heartbeat_interval_ms: u32,
    pub arena_tick_interval_ms: u32,
    pub auto_save_interval_ms: u32,
    pub mood_decay_interval_ms: u32,
    /// Soft period of the cooperative main loop
    pub loop_interval_ms: u32,

    // --- Presentation ---
    /// Length of the ACK blink after an acknowledged heartbeat
    pub ack_blink_ms: u32,
    /// How long a visual intent (eating, hurt, …) stays reported
    pub visual_hold_ms: u32,

    // --- Game rules ---
    /// Lifetime heartbeats between egg eligibility checks
    pub egg_hatch_heartbeats: u32,
    /// Bonus XP per acknowledged heartbeat while hibernating
    pub hibernation_xp_per_heartbeat: u32,
    pub device_tier: CapabilityTier,
    pub progression: Progression,
    pub mood: MoodTuning,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            api_endpoint: "https://us-central1-mohnsters.cloudfunctions.net".into(),
            http_timeout_ms: 8_000,

            heartbeat_interval_ms: 300_000, // 5 min
            arena_tick_interval_ms: 5_000,
            auto_save_interval_ms: 300_000,
            mood_decay_interval_ms: 60_000,
            loop_interval_ms: 10,

            ack_blink_ms: 600,
            visual_hold_ms: 3_000,

            egg_hatch_heartbeats: 144, // 12 h at the default cadence
            hibernation_xp_per_heartbeat: 1,
            device_tier: CapabilityTier::Nano,
            progression: Progression::default(),
            mood: MoodTuning::default(),
        }
    }
}

impl NodeConfig {
    /// Rules handed to the creature state machine.
    pub fn creature_rules(&self) -> CreatureRules {
        CreatureRules {
            progression: self.progression.clone(),
            mood: self.mood,
            tier: self.device_tier,
            visual_hold_ms: self.visual_hold_ms as u64,
        }
    }

    /// Full URL for one of the endpoint paths.
    pub fn endpoint(&self, path: &str) -> String {
        let base = self.api_endpoint.trim_end_matches('/');
        let mut url = String::with_capacity(base.len() + path.len());
        url.push_str(base);
        url.push_str(path);
        url
    }

    /// Reject values that would break scheduling or game rules.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.api_endpoint.starts_with("http://") || self.api_endpoint.starts_with("https://"))
        {
            return Err(ConfigError::ValidationFailed("api_endpoint must be an http(s) URL"));
        }
        if !(10_000..=86_400_000).contains(&self.heartbeat_interval_ms) {
            return Err(ConfigError::ValidationFailed("heartbeat_interval_ms out of range"));
        }
        if !(1_000..=600_000).contains(&self.arena_tick_interval_ms) {
            return Err(ConfigError::ValidationFailed("arena_tick_interval_ms out of range"));
        }
        if !(10_000..=86_400_000).contains(&self.auto_save_interval_ms) {
            return Err(ConfigError::ValidationFailed("auto_save_interval_ms out of range"));
        }
        if self.mood_decay_interval_ms < 1_000 {
            return Err(ConfigError::ValidationFailed("mood_decay_interval_ms too small"));
        }
        if !(500..=30_000).contains(&self.http_timeout_ms) {
            return Err(ConfigError::ValidationFailed("http_timeout_ms out of range"));
        }
        if self.http_timeout_ms >= self.arena_tick_interval_ms {
            return Err(ConfigError::ValidationFailed(
                "http_timeout_ms must be shorter than the arena interval",
            ));
        }
        if self.loop_interval_ms == 0 || self.loop_interval_ms > 1_000 {
            return Err(ConfigError::ValidationFailed("loop_interval_ms out of range"));
        }
        if self.egg_hatch_heartbeats == 0 {
            return Err(ConfigError::ValidationFailed("egg_hatch_heartbeats must be >= 1"));
        }
        self.progression.validate()
    }
}

// ───────────────────────────────────────────────────────────────
// Load / save through the persistence port
// ───────────────────────────────────────────────────────────────

/// Load the stored config; falls back to defaults when absent or invalid.
pub fn load_config(store: &impl PersistencePort) -> NodeConfig {
    let Some(json) = store.get_str(ns::NODE, CONFIG_KEY) else {
        info!("Config: none stored, using defaults");
        return NodeConfig::default();
    };
    let parsed: Result<NodeConfig, ConfigError> =
        serde_json::from_str(&json).map_err(|_| ConfigError::Corrupted);
    match parsed.and_then(|c| c.validate().map(|()| c)) {
        Ok(config) => config,
        Err(e) => {
            warn!("Config: stored config rejected ({}), using defaults", e);
            NodeConfig::default()
        }
    }
}

/// Validate and persist.
pub fn save_config(store: &mut impl PersistencePort, config: &NodeConfig) -> Result<(), ConfigError> {
    config.validate()?;
    let json = serde_json::to_string(config).map_err(|_| ConfigError::Corrupted)?;
    store.put_str(ns::NODE, CONFIG_KEY, &json)?;
    info!("Config: saved ({} bytes)", json.len());
    Ok(())
}
