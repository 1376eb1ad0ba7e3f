use std::path::Path;

use log::{debug, trace};
use ndarray::{Array2, ArrayView1};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::{Agent, Transition};
use crate::error::{Result, VantageError};
use crate::network::{NetworkConfig, NetworkFactory, NetworkParameters, Synchronization, ValueNetwork};
use crate::replay_buffer::{Experience, ReplayBuffer};

/// When and how the target network follows the online network.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetUpdate {
    /// Hard copy after every `every`-th learning call.
    Hard { every: usize },
    /// Soft update after every learning call:
    /// `target = smoothing_factor * target + (1 - smoothing_factor) * online`.
    Soft { smoothing_factor: f32 },
}

impl Default for TargetUpdate {
    fn default() -> Self {
        TargetUpdate::Soft { smoothing_factor: 0.995 }
    }
}

/// Multiplicative epsilon decay, applied once per learning call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EpsilonSchedule {
    pub start: f32,
    pub end: f32,
    pub decay: f32,
}

impl Default for EpsilonSchedule {
    fn default() -> Self {
        EpsilonSchedule {
            start: 1.0,
            end: 0.01,
            decay: 0.995,
        }
    }
}

impl EpsilonSchedule {
    /// Exploration rate fixed at `epsilon`.
    pub fn constant(epsilon: f32) -> Self {
        EpsilonSchedule {
            start: epsilon,
            end: epsilon,
            decay: 1.0,
        }
    }

    fn validate(&self) -> Result<()> {
        let in_unit = |v: f32| (0.0..=1.0).contains(&v);
        if !in_unit(self.start) || !in_unit(self.end) || self.end > self.start {
            return Err(VantageError::invalid_parameter(
                "epsilon".to_string(),
                format!("need 0 <= end <= start <= 1, got start={} end={}", self.start, self.end),
            ));
        }
        if !(self.decay > 0.0 && self.decay <= 1.0) {
            return Err(VantageError::invalid_parameter(
                "epsilon_decay".to_string(),
                format!("must lie in (0, 1], got {}", self.decay),
            ));
        }
        Ok(())
    }
}

/// Deep Q-Network agent with a target network
///
/// - Epsilon-greedy exploration with multiplicative decay
/// - One-step TD targets `r + gamma * max_a Q_target(s', a)`, without
///   bootstrapping on terminal transitions
/// - Optional experience replay; without it every transition is learned
///   as a batch of one
/// - Target-network synchronization happens only inside [`Agent::learn`]
///
/// # Example
///
/// ```rust,no_run
/// use vantage::agent::{DqnAgentBuilder, TargetUpdate};
/// use vantage::network::{Architecture, NetworkConfig};
///
/// let config = NetworkConfig::new(4, 2, vec![64, 64]).with_architecture(Architecture::Dueling);
/// let agent = DqnAgentBuilder::new()
///     .network_config(config)
///     .gamma(0.99)
///     .target_update(TargetUpdate::Hard { every: 500 })
///     .replay(10_000, 32)
///     .build()
///     .unwrap();
/// ```
pub struct DqnAgent {
    online: Box<dyn ValueNetwork>,
    target: Box<dyn ValueNetwork>,
    epsilon: f32,
    schedule: EpsilonSchedule,
    gamma: f32,
    target_update: TargetUpdate,
    terminal_on_truncation: bool,
    replay: Option<ReplayBuffer>,
    batch_size: usize,
    learn_calls: usize,
    rng: StdRng,
}

impl DqnAgent {
    pub fn builder() -> DqnAgentBuilder {
        DqnAgentBuilder::new()
    }

    pub fn online(&self) -> &dyn ValueNetwork {
        self.online.as_ref()
    }

    pub fn target(&self) -> &dyn ValueNetwork {
        self.target.as_ref()
    }

    pub fn epsilon(&self) -> f32 {
        self.epsilon
    }

    /// Override the current exploration rate
    pub fn set_epsilon(&mut self, epsilon: f32) {
        self.epsilon = epsilon.clamp(0.0, 1.0);
    }

    pub fn gamma(&self) -> f32 {
        self.gamma
    }

    /// Number of completed `learn` calls
    pub fn learn_calls(&self) -> usize {
        self.learn_calls
    }

    pub fn replay_len(&self) -> usize {
        self.replay.as_ref().map_or(0, ReplayBuffer::len)
    }

    /// Index of the largest online Q-value; ties go to the lowest index.
    pub fn greedy_action(&self, state: ArrayView1<f32>) -> Result<usize> {
        let q_values = self.online.forward(state)?;
        argmax(q_values.view())
    }

    fn train_on_batch(&mut self, experiences: &[&Experience]) -> Result<()> {
        let batch_size = experiences.len();
        let state_size = self.online.input_size();

        let mut states = Array2::zeros((batch_size, state_size));
        let mut next_states = Array2::zeros((batch_size, state_size));
        for (i, exp) in experiences.iter().enumerate() {
            if exp.state.len() != state_size || exp.next_state.len() != state_size {
                return Err(VantageError::dimension_mismatch(
                    format!("states with {} features", state_size),
                    format!("states with {} and {} features", exp.state.len(), exp.next_state.len()),
                ));
            }
            states.row_mut(i).assign(&exp.state);
            next_states.row_mut(i).assign(&exp.next_state);
        }

        let mut targets = self.online.forward_batch(states.view())?;
        let next_q_values = self.target.forward_batch(next_states.view())?;
        for (i, exp) in experiences.iter().enumerate() {
            let bootstrap = if exp.terminal {
                0.0
            } else {
                next_q_values.row(i).iter().fold(f32::NEG_INFINITY, |max, &v| max.max(v))
            };
            targets[[i, exp.action]] = exp.reward + self.gamma * bootstrap;
        }

        self.online.update(states.view(), targets.view())
    }

    fn sync_target(&mut self) -> Result<()> {
        match self.target_update {
            TargetUpdate::Hard { every } => {
                if self.learn_calls % every == 0 {
                    debug!("DqnAgent::sync_target() hard copy after {} learn calls", self.learn_calls);
                    self.target.synchronize(self.online.as_ref(), Synchronization::Hard)?;
                }
            }
            TargetUpdate::Soft { smoothing_factor } => {
                self.target
                    .synchronize(self.online.as_ref(), Synchronization::Soft { smoothing_factor })?;
            }
        }
        Ok(())
    }

    /// Save the online network's parameters
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        self.online.export_parameters().save(path)
    }

    /// Load parameters into both the online and the target network
    pub fn load<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let parameters = NetworkParameters::load(path)?;
        self.online.import_parameters(&parameters)?;
        self.target.import_parameters(&parameters)
    }
}

fn argmax(values: ArrayView1<f32>) -> Result<usize> {
    values
        .iter()
        .enumerate()
        .fold(None, |best: Option<(usize, f32)>, (i, &v)| match best {
            Some((_, best_value)) if !(v > best_value) => best,
            _ => Some((i, v)),
        })
        .map(|(i, _)| i)
        .ok_or_else(|| VantageError::NumericalError("No valid Q-values".to_string()))
}

impl<I> Agent<I> for DqnAgent {
    fn select_action(&mut self, state: ArrayView1<f32>) -> Result<usize> {
        if self.rng.gen::<f32>() < self.epsilon {
            Ok(self.rng.gen_range(0..self.online.output_size()))
        } else {
            self.greedy_action(state)
        }
    }

    fn learn(&mut self, transition: &Transition<'_, I>) -> Result<()> {
        let max_actions = self.online.output_size();
        if transition.action >= max_actions {
            return Err(VantageError::InvalidAction {
                action: transition.action,
                max_actions,
            });
        }

        let experience = Experience {
            state: transition.state.to_owned(),
            action: transition.action,
            reward: transition.reward,
            next_state: transition.next_state.to_owned(),
            terminal: transition.done || (transition.truncated && self.terminal_on_truncation),
        };

        match self.replay.take() {
            Some(mut replay) => {
                replay.add(experience);
                let result = if replay.len() >= self.batch_size {
                    let batch = replay.sample(self.batch_size, &mut self.rng);
                    self.train_on_batch(&batch)
                } else {
                    Ok(())
                };
                self.replay = Some(replay);
                result?;
            }
            None => self.train_on_batch(&[&experience])?,
        }

        self.learn_calls += 1;
        self.sync_target()?;
        self.epsilon = (self.epsilon * self.schedule.decay).max(self.schedule.end);

        trace!(
            "DqnAgent::learn() total_step={} episode_step={} loss={:?} epsilon={}",
            transition.total_step,
            transition.episode_step,
            self.online.last_loss(),
            self.epsilon
        );
        Ok(())
    }
}

/// Builder pattern for DqnAgent
pub struct DqnAgentBuilder {
    network_config: Option<NetworkConfig>,
    factory: Option<Box<dyn NetworkFactory>>,
    schedule: EpsilonSchedule,
    gamma: f32,
    target_update: TargetUpdate,
    terminal_on_truncation: bool,
    replay: Option<(usize, usize)>,
    seed: Option<u64>,
}

impl DqnAgentBuilder {
    pub fn new() -> Self {
        DqnAgentBuilder {
            network_config: None,
            factory: None,
            schedule: EpsilonSchedule::default(),
            gamma: 0.99,
            target_update: TargetUpdate::default(),
            terminal_on_truncation: false,
            replay: None,
            seed: None,
        }
    }

    pub fn network_config(mut self, config: NetworkConfig) -> Self {
        self.network_config = Some(config);
        self
    }

    /// Build networks with `factory` instead of the configured architecture.
    pub fn network_factory<F: NetworkFactory + 'static>(mut self, factory: F) -> Self {
        self.factory = Some(Box::new(factory));
        self
    }

    pub fn epsilon(mut self, schedule: EpsilonSchedule) -> Self {
        self.schedule = schedule;
        self
    }

    pub fn gamma(mut self, gamma: f32) -> Self {
        self.gamma = gamma;
        self
    }

    pub fn target_update(mut self, target_update: TargetUpdate) -> Self {
        self.target_update = target_update;
        self
    }

    /// Treat truncated transitions as terminal when computing targets.
    pub fn terminal_on_truncation(mut self, terminal: bool) -> Self {
        self.terminal_on_truncation = terminal;
        self
    }

    /// Learn from minibatches sampled out of a replay buffer.
    pub fn replay(mut self, capacity: usize, batch_size: usize) -> Self {
        self.replay = Some((capacity, batch_size));
        self
    }

    /// Seed for exploration and replay sampling.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn build(self) -> Result<DqnAgent> {
        let config = self.network_config.ok_or_else(|| {
            VantageError::invalid_parameter("network_config", "Network configuration must be specified")
        })?;
        self.schedule.validate()?;
        if !(0.0..=1.0).contains(&self.gamma) {
            return Err(VantageError::invalid_parameter(
                "gamma".to_string(),
                format!("must lie in [0, 1], got {}", self.gamma),
            ));
        }
        match self.target_update {
            TargetUpdate::Hard { every: 0 } => {
                return Err(VantageError::invalid_parameter("target_update", "hard update period must be positive"));
            }
            TargetUpdate::Soft { smoothing_factor } if !(0.0..=1.0).contains(&smoothing_factor) => {
                return Err(VantageError::invalid_parameter(
                    "target_update".to_string(),
                    format!("smoothing factor must lie in [0, 1], got {}", smoothing_factor),
                ));
            }
            _ => {}
        }
        let (replay, batch_size) = match self.replay {
            Some((capacity, batch_size)) => {
                if batch_size == 0 || capacity < batch_size {
                    return Err(VantageError::invalid_parameter(
                        "replay".to_string(),
                        format!("need 0 < batch_size <= capacity, got {} and {}", batch_size, capacity),
                    ));
                }
                (Some(ReplayBuffer::new(capacity)), batch_size)
            }
            None => (None, 1),
        };

        let (online, mut target) = match &self.factory {
            Some(factory) => (factory.build(&config)?, factory.build(&config)?),
            None => (config.build()?, config.build()?),
        };
        target.synchronize(online.as_ref(), Synchronization::Hard)?;

        let rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        debug!(
            "Built DqnAgent gamma={} target_update={:?} replay={:?}",
            self.gamma, self.target_update, self.replay
        );

        Ok(DqnAgent {
            online,
            target,
            epsilon: self.schedule.start,
            schedule: self.schedule,
            gamma: self.gamma,
            target_update: self.target_update,
            terminal_on_truncation: self.terminal_on_truncation,
            replay,
            batch_size,
            learn_calls: 0,
            rng,
        })
    }
}

impl Default for DqnAgentBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::arr1;

    #[test]
    fn test_argmax_prefers_first_of_ties() {
        assert_eq!(argmax(arr1(&[1.0, 3.0, 3.0]).view()).unwrap(), 1);
        assert_eq!(argmax(arr1(&[-2.0]).view()).unwrap(), 0);
        assert!(argmax(arr1::<f32>(&[]).view()).is_err());
    }
}
