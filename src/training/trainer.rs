use log::{debug, info};
use ndarray::Array1;

use crate::agent::{Agent, Transition};
use crate::environment::{Environment, Step};
use crate::error::{Result, VantageError};

use super::config::{TrainingConfig, TruncationPolicy};
use super::history::RewardHistory;
use super::sink::{EpisodeSink, EpisodeSummary, TextLogSink};

/// Where a [`TrainingLoop`] is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Idle,
    EpisodeRunning,
    EpisodeDone,
    Finished,
    /// A failure from the environment, the agent or a sink stopped the run.
    Aborted,
}

/// Result of a completed run.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingReport {
    pub episodes: Vec<EpisodeSummary>,
    pub history: RewardHistory,
    pub total_steps: usize,
}

impl TrainingReport {
    pub fn final_average(&self) -> f32 {
        self.history.rolling_average()
    }
}

/// Drives an [`Agent`] through episodes of an [`Environment`].
///
/// A loop runs once. Within an episode the step counter starts at 1 and the
/// episode ends when the environment reports `done` or the counter reaches
/// `episode_length`, so at most `episode_length - 1` steps execute. An action
/// is selected before the first step and again after every step.
pub struct TrainingLoop<A, E> {
    config: TrainingConfig,
    agent: A,
    env: E,
    sinks: Vec<Box<dyn EpisodeSink>>,
    history: RewardHistory,
    state: LoopState,
    total_steps: usize,
}

impl<A, E> TrainingLoop<A, E>
where
    E: Environment,
    A: Agent<E::Info>,
{
    pub fn new(config: TrainingConfig, agent: A, env: E) -> Result<Self> {
        config.validate()?;
        let history = RewardHistory::new(config.average_reward_steps)?;
        Ok(TrainingLoop {
            config,
            agent,
            env,
            sinks: Vec::new(),
            history,
            state: LoopState::Idle,
            total_steps: 0,
        })
    }

    pub fn builder() -> TrainingLoopBuilder<A, E> {
        TrainingLoopBuilder::new()
    }

    pub fn add_sink<S: EpisodeSink + 'static>(&mut self, sink: S) {
        self.sinks.push(Box::new(sink));
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    pub fn history(&self) -> &RewardHistory {
        &self.history
    }

    pub fn total_steps(&self) -> usize {
        self.total_steps
    }

    pub fn agent(&self) -> &A {
        &self.agent
    }

    pub fn agent_mut(&mut self) -> &mut A {
        &mut self.agent
    }

    pub fn env(&self) -> &E {
        &self.env
    }

    pub fn into_parts(self) -> (A, E) {
        (self.agent, self.env)
    }

    /// Run every configured episode.
    ///
    /// The first error aborts the run and is returned as is; the loop is left
    /// in [`LoopState::Aborted`].
    pub fn run(&mut self) -> Result<TrainingReport> {
        if self.state != LoopState::Idle {
            return Err(VantageError::TrainingError(format!(
                "training loop can only run once, current state is {:?}",
                self.state
            )));
        }
        self.config.validate()?;

        match self.run_episodes() {
            Ok(episodes) => {
                self.state = LoopState::Finished;
                info!(
                    "Training finished: {} episodes, {} steps, final average {}",
                    episodes.len(),
                    self.total_steps,
                    self.history.rolling_average()
                );
                Ok(TrainingReport {
                    episodes,
                    history: self.history.clone(),
                    total_steps: self.total_steps,
                })
            }
            Err(err) => {
                self.state = LoopState::Aborted;
                Err(err)
            }
        }
    }

    fn run_episodes(&mut self) -> Result<Vec<EpisodeSummary>> {
        if let Some(path) = &self.config.log_file {
            let sink = TextLogSink::create(path)?;
            self.sinks.push(Box::new(sink));
        }

        let mut episodes = Vec::with_capacity(self.config.num_episodes);
        for episode in 0..self.config.num_episodes {
            self.state = LoopState::EpisodeRunning;
            let summary = self.run_episode(episode)?;
            self.state = LoopState::EpisodeDone;

            for sink in self.sinks.iter_mut() {
                sink.record(&summary)?;
            }
            if self.config.verbose {
                info!(
                    "Episode {}: steps {} reward {} average {}",
                    episode, summary.steps, summary.reward, summary.rolling_average
                );
            }
            episodes.push(summary);
        }
        Ok(episodes)
    }

    fn run_episode(&mut self, episode: usize) -> Result<EpisodeSummary> {
        let observation_space = self.env.observation_space();
        let action_space = self.env.action_space();
        let episode_length = self.config.episode_length;
        let signal_truncation = self.config.truncation_policy == TruncationPolicy::Signal;

        let mut state = self.env.reset()?;
        check_observation(state.len(), observation_space)?;
        let mut action = self.select_checked(&state, action_space)?;

        let mut step = 1;
        let mut done = false;
        let mut episode_reward = 0.0;
        let mut actions = Vec::new();

        while !done && step < episode_length {
            actions.push(action);
            let Step {
                next_state,
                reward,
                done: reached_terminal,
                info,
            } = self.env.step(action)?;
            check_observation(next_state.len(), observation_space)?;

            episode_reward += reward;
            done = reached_terminal;
            let truncated = signal_truncation && !done && step + 1 >= episode_length;

            let transition = Transition {
                total_step: self.total_steps,
                episode_step: step,
                state: state.view(),
                next_state: next_state.view(),
                reward,
                action,
                done,
                truncated,
                info: &info,
            };
            self.agent.learn(&transition)?;

            state = next_state;
            action = self.select_checked(&state, action_space)?;
            step += 1;
            self.total_steps += 1;
        }

        let rolling_average = self.history.push(episode_reward);
        debug!("Episode {} ended after {} steps, done={}", episode, step - 1, done);

        Ok(EpisodeSummary {
            episode,
            steps: step - 1,
            reward: episode_reward,
            rolling_average,
            actions,
            terminated: done,
        })
    }

    fn select_checked(&mut self, state: &Array1<f32>, action_space: usize) -> Result<usize> {
        let action = self.agent.select_action(state.view())?;
        if action >= action_space {
            return Err(VantageError::Agent(format!(
                "selected action {} outside of an action space of {}",
                action, action_space
            )));
        }
        Ok(action)
    }
}

fn check_observation(len: usize, observation_space: usize) -> Result<()> {
    if len != observation_space {
        return Err(VantageError::Environment(format!(
            "observation has {} features, observation space is {}",
            len, observation_space
        )));
    }
    Ok(())
}

/// Assembles a [`TrainingLoop`]; agent and environment are mandatory.
pub struct TrainingLoopBuilder<A, E> {
    config: Option<TrainingConfig>,
    agent: Option<A>,
    env: Option<E>,
    sinks: Vec<Box<dyn EpisodeSink>>,
}

impl<A, E> Default for TrainingLoopBuilder<A, E> {
    fn default() -> Self {
        TrainingLoopBuilder {
            config: None,
            agent: None,
            env: None,
            sinks: Vec::new(),
        }
    }
}

impl<A, E> TrainingLoopBuilder<A, E>
where
    E: Environment,
    A: Agent<E::Info>,
{
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(mut self, config: TrainingConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn agent(mut self, agent: A) -> Self {
        self.agent = Some(agent);
        self
    }

    pub fn env(mut self, env: E) -> Self {
        self.env = Some(env);
        self
    }

    pub fn sink<S: EpisodeSink + 'static>(mut self, sink: S) -> Self {
        self.sinks.push(Box::new(sink));
        self
    }

    pub fn build(self) -> Result<TrainingLoop<A, E>> {
        let config = self
            .config
            .ok_or_else(|| VantageError::invalid_parameter("config", "a training config is required"))?;
        let agent = self
            .agent
            .ok_or_else(|| VantageError::invalid_parameter("agent", "Agent can not be None"))?;
        let env = self
            .env
            .ok_or_else(|| VantageError::invalid_parameter("env", "Environment can not be None"))?;

        let mut training = TrainingLoop::new(config, agent, env)?;
        training.sinks = self.sinks;
        Ok(training)
    }
}
