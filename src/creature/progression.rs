//! Level curve and per-stage evolution requirements.
//!
//! Both tables are plain data carried in [`NodeConfig`](crate::config::NodeConfig)
//! so game balance can change without touching the state machine.

use serde::{Deserialize, Serialize};

use super::Stage;
use crate::capabilities::CapabilityTier;
use crate::error::ConfigError;

/// Gate for entering `stage`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageRequirement {
    pub stage: Stage,
    pub min_level: u8,
    pub min_xp: u32,
    /// Smallest device tier able to host the stage.
    pub min_tier: CapabilityTier,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progression {
    /// `level_thresholds[i]` is the total XP needed for level `i + 1`.
    pub level_thresholds: Vec<u32>,
    /// One entry per stage after `Egg`, in evolution order.
    pub stages: Vec<StageRequirement>,
}

impl Default for Progression {
    fn default() -> Self {
        Self {
            level_thresholds: vec![
                0, 10, 30, 60, 100, 150, 220, 300, 400, 520, 660, 820, 1000, 1250, 1500, 1800,
                2150, 2550, 3000, 3500,
            ],
            stages: vec![
                StageRequirement {
                    stage: Stage::Baby,
                    min_level: 2,
                    min_xp: 10,
                    min_tier: CapabilityTier::Nano,
                },
                StageRequirement {
                    stage: Stage::Juvenile,
                    min_level: 5,
                    min_xp: 100,
                    min_tier: CapabilityTier::Nano,
                },
                StageRequirement {
                    stage: Stage::Adult,
                    min_level: 10,
                    min_xp: 520,
                    min_tier: CapabilityTier::SmallTank,
                },
                StageRequirement {
                    stage: Stage::Mythic,
                    min_level: 18,
                    min_xp: 2550,
                    min_tier: CapabilityTier::Aquarium,
                },
            ],
        }
    }
}

impl Progression {
    /// Highest level whose threshold `total_xp` has reached (at least 1).
    pub fn level_for_xp(&self, total_xp: u32) -> u8 {
        let reached = self
            .level_thresholds
            .iter()
            .take_while(|&&t| t <= total_xp)
            .count();
        reached.clamp(1, u8::MAX as usize) as u8
    }

    pub fn requirement_for(&self, stage: Stage) -> Option<&StageRequirement> {
        self.stages.iter().find(|r| r.stage == stage)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.level_thresholds.first() {
            Some(0) => {}
            _ => return Err(ConfigError::ValidationFailed("level curve must start at 0 XP")),
        }
        if self.level_thresholds.len() > u8::MAX as usize {
            return Err(ConfigError::ValidationFailed("level curve too long"));
        }
        if self.level_thresholds.windows(2).any(|w| w[0] >= w[1]) {
            return Err(ConfigError::ValidationFailed(
                "level thresholds must be strictly increasing",
            ));
        }
        let expected = &Stage::ALL[1..];
        if self.stages.len() != expected.len()
            || self.stages.iter().zip(expected).any(|(r, s)| r.stage != *s)
        {
            return Err(ConfigError::ValidationFailed(
                "stage table must list every stage after Egg in order",
            ));
        }
        if self.stages.windows(2).any(|w| {
            w[0].min_level > w[1].min_level || w[0].min_tier > w[1].min_tier
        }) {
            return Err(ConfigError::ValidationFailed(
                "stage requirements must not decrease",
            ));
        }
        Ok(())
    }
}
