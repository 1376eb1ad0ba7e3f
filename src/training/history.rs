use std::collections::VecDeque;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, VantageError};

/// Episode rewards of one training run.
///
/// Keeps every episode total, plus a rolling window of the most recent
/// `capacity` totals. The rolling average always divides by `capacity`, so
/// it is under-weighted until the window has filled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RewardHistory {
    rewards: Vec<f32>,
    window: VecDeque<f32>,
    capacity: usize,
}

impl RewardHistory {
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity <= 1 {
            return Err(VantageError::invalid_parameter(
                "average_reward_steps".to_string(),
                format!("Reward must be averaged on more than 1 episode, got {}", capacity),
            ));
        }
        Ok(RewardHistory {
            rewards: Vec::new(),
            window: VecDeque::with_capacity(capacity),
            capacity,
        })
    }

    /// Record an episode total and return the new rolling average.
    pub fn push(&mut self, episode_reward: f32) -> f32 {
        self.rewards.push(episode_reward);
        if self.window.len() == self.capacity {
            self.window.pop_front();
        }
        self.window.push_back(episode_reward);
        self.rolling_average()
    }

    pub fn rolling_average(&self) -> f32 {
        self.window.iter().sum::<f32>() / self.capacity as f32
    }

    /// Every episode total, oldest first.
    pub fn rewards(&self) -> &[f32] {
        &self.rewards
    }

    /// Rewards currently inside the rolling window, oldest first.
    pub fn window(&self) -> impl Iterator<Item = f32> + '_ {
        self.window.iter().copied()
    }

    pub fn window_len(&self) -> usize {
        self.window.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.rewards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rewards.is_empty()
    }

    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let serialized = serde_json::to_string_pretty(self)?;
        fs::write(path, serialized)?;
        Ok(())
    }

    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&data)?)
    }
}
