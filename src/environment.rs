use ndarray::Array1;

use crate::error::Result;

/// Outcome of one environment step.
#[derive(Clone, Debug, PartialEq)]
pub struct Step<I> {
    pub next_state: Array1<f32>,
    pub reward: f32,
    /// True only when a terminal state was reached.
    pub done: bool,
    /// Side channel the training loop passes through without interpreting.
    pub info: I,
}

impl<I> Step<I> {
    pub fn new(next_state: Array1<f32>, reward: f32, done: bool, info: I) -> Self {
        Step {
            next_state,
            reward,
            done,
            info,
        }
    }
}

/// A single-agent episodic environment with a discrete action space.
pub trait Environment {
    type Info;

    /// Start a new episode and return its initial observation.
    fn reset(&mut self) -> Result<Array1<f32>>;

    /// Apply `action` to the current episode.
    ///
    /// Implementations report `step` before `reset` as
    /// [`VantageError::Environment`](crate::error::VantageError::Environment).
    fn step(&mut self, action: usize) -> Result<Step<Self::Info>>;

    /// Observation dimensionality.
    fn observation_space(&self) -> usize;

    /// Number of discrete actions.
    fn action_space(&self) -> usize;
}

impl<E: Environment + ?Sized> Environment for &mut E {
    type Info = E::Info;

    fn reset(&mut self) -> Result<Array1<f32>> {
        (**self).reset()
    }

    fn step(&mut self, action: usize) -> Result<Step<Self::Info>> {
        (**self).step(action)
    }

    fn observation_space(&self) -> usize {
        (**self).observation_space()
    }

    fn action_space(&self) -> usize {
        (**self).action_space()
    }
}
