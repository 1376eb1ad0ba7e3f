use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, VantageError};

/// Conventional name of the per-episode text log.
pub const DEFAULT_LOG_FILE: &str = "training_log.txt";

fn default_average_reward_steps() -> usize {
    5
}

/// Whether the learner is told that an episode was cut off by the step bound.
///
/// Truncation never sets `done`; this only controls `Transition::truncated`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TruncationPolicy {
    /// Never flag truncation.
    #[default]
    Silent,
    /// Flag the last transition of a truncated episode.
    Signal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingConfig {
    pub num_episodes: usize,
    /// Step bound per episode; at most `episode_length - 1` steps run.
    pub episode_length: usize,
    /// Capacity of the rolling reward window; must exceed 1.
    #[serde(default = "default_average_reward_steps")]
    pub average_reward_steps: usize,
    /// Destination of the per-episode text log. The log is opt-in: when this
    /// is `None` no file is written and records only reach the loop's sinks.
    #[serde(default)]
    pub log_file: Option<PathBuf>,
    #[serde(default)]
    pub truncation_policy: TruncationPolicy,
    /// Log a progress line per episode at info level.
    #[serde(default)]
    pub verbose: bool,
}

impl TrainingConfig {
    /// Configuration with default averaging and truncation policy.
    ///
    /// No text log is written unless one is requested with
    /// [`TrainingConfig::with_log_file`] or [`TrainingConfig::with_default_log_file`].
    pub fn new(num_episodes: usize, episode_length: usize) -> Self {
        TrainingConfig {
            num_episodes,
            episode_length,
            average_reward_steps: default_average_reward_steps(),
            log_file: None,
            truncation_policy: TruncationPolicy::default(),
            verbose: false,
        }
    }

    pub fn with_average_reward_steps(mut self, steps: usize) -> Self {
        self.average_reward_steps = steps;
        self
    }

    pub fn with_log_file<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.log_file = Some(path.into());
        self
    }

    /// Write the text log to [`DEFAULT_LOG_FILE`] in the working directory.
    pub fn with_default_log_file(self) -> Self {
        self.with_log_file(DEFAULT_LOG_FILE)
    }

    pub fn with_truncation_policy(mut self, policy: TruncationPolicy) -> Self {
        self.truncation_policy = policy;
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.num_episodes == 0 {
            return Err(VantageError::invalid_parameter("num_episodes", "must be positive"));
        }
        if self.episode_length == 0 {
            return Err(VantageError::invalid_parameter("episode_length", "must be positive"));
        }
        if self.average_reward_steps <= 1 {
            return Err(VantageError::invalid_parameter(
                "average_reward_steps".to_string(),
                format!("Reward must be averaged on more than 1 episode, got {}", self.average_reward_steps),
            ));
        }
        Ok(())
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&data)?;
        config.validate()?;
        Ok(config)
    }
}
