//! Mood dimensions and their time-based decay.

use serde::{Deserialize, Serialize};

/// Upper bound of every mood dimension.
pub const MOOD_MAX: u8 = 100;

const MS_PER_HOUR: u64 = 3_600_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mood {
    /// Satiety: 100 = full.
    pub hunger: u8,
    pub happiness: u8,
    pub energy: u8,
}

impl Mood {
    pub(crate) fn raise(value: u8, amount: u8) -> u8 {
        value.saturating_add(amount).min(MOOD_MAX)
    }

    pub(crate) fn clamp(&mut self) {
        self.hunger = self.hunger.min(MOOD_MAX);
        self.happiness = self.happiness.min(MOOD_MAX);
        self.energy = self.energy.min(MOOD_MAX);
    }
}

/// Decay rates and the amounts applied by care actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoodTuning {
    /// Points lost per hour; 0 disables decay for that dimension.
    pub hunger_decay_per_hour: u16,
    pub happiness_decay_per_hour: u16,
    pub energy_decay_per_hour: u16,
    /// Local input actions (button / menu).
    pub input_feed: u8,
    pub input_play: u8,
    pub input_rest: u8,
    /// Server-issued `feed` / `play` commands.
    pub command_feed: u8,
    pub command_play: u8,
}

impl Default for MoodTuning {
    fn default() -> Self {
        Self {
            hunger_decay_per_hour: 4,
            happiness_decay_per_hour: 3,
            energy_decay_per_hour: 2,
            input_feed: 15,
            input_play: 20,
            input_rest: 30,
            command_feed: 30,
            command_play: 20,
        }
    }
}

/// Sub-point elapsed time per dimension, carried between decay steps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MoodDecay {
    carry_ms: [u64; 3],
}

impl MoodDecay {
    pub fn apply(&mut self, mood: &mut Mood, tuning: &MoodTuning, elapsed_ms: u64) {
        let dims = [
            (&mut mood.hunger, tuning.hunger_decay_per_hour),
            (&mut mood.happiness, tuning.happiness_decay_per_hour),
            (&mut mood.energy, tuning.energy_decay_per_hour),
        ];
        for ((value, rate), carry) in dims.into_iter().zip(self.carry_ms.iter_mut()) {
            if rate == 0 {
                *carry = 0;
                continue;
            }
            let ms_per_point = (MS_PER_HOUR / rate as u64).max(1);
            *carry = carry.saturating_add(elapsed_ms);
            let points = *carry / ms_per_point;
            *carry -= points * ms_per_point;
            *value = value.saturating_sub(points.min(u8::MAX as u64) as u8);
        }
    }
}
