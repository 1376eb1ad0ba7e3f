//! # Training
//!
//! The episodic loop that ties an [`Agent`](crate::agent::Agent) to an
//! [`Environment`](crate::environment::Environment), together with its
//! configuration, the reward history it keeps, and the sinks that receive a
//! record per episode.

mod config;
mod history;
mod sink;
mod trainer;

pub use config::{TrainingConfig, TruncationPolicy, DEFAULT_LOG_FILE};
pub use history::RewardHistory;
pub use sink::{format_record, EpisodeSink, EpisodeSummary, MemorySink, TextLogSink};
pub use trainer::{LoopState, TrainingLoop, TrainingLoopBuilder, TrainingReport};
