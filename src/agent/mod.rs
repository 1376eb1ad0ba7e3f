//! # Agents
//!
//! The training loop talks to an agent through exactly two calls:
//! [`Agent::select_action`] and [`Agent::learn`]. Everything else (value
//! updates, target-network synchronization, exploration schedules) happens
//! behind `learn`.
//!
//! [`DqnAgent`] is the reference implementation: an epsilon-greedy
//! Q-learner with an online and a target [`ValueNetwork`](crate::network::ValueNetwork)
//! built by a configurable [`NetworkFactory`](crate::network::NetworkFactory).

mod dqn;

pub use dqn::{DqnAgent, DqnAgentBuilder, EpsilonSchedule, TargetUpdate};

use ndarray::ArrayView1;

use crate::error::Result;

/// Everything the loop knows at the moment a step completes.
#[derive(Debug, Clone, Copy)]
pub struct Transition<'a, I> {
    /// Steps taken since the run started, counted from 0.
    pub total_step: usize,
    /// Position of this step in its episode, counted from 1.
    pub episode_step: usize,
    pub state: ArrayView1<'a, f32>,
    pub next_state: ArrayView1<'a, f32>,
    pub reward: f32,
    pub action: usize,
    pub done: bool,
    /// Set on the last step of an episode cut off by the step bound, and
    /// only when the loop signals truncation. Never implies `done`.
    pub truncated: bool,
    pub info: &'a I,
}

/// The capability set the training loop drives.
pub trait Agent<I> {
    /// Choose an action for `state`. May advance internal exploration state.
    fn select_action(&mut self, state: ArrayView1<f32>) -> Result<usize>;

    /// Learn from one transition.
    fn learn(&mut self, transition: &Transition<'_, I>) -> Result<()>;
}

impl<I, A: Agent<I> + ?Sized> Agent<I> for &mut A {
    fn select_action(&mut self, state: ArrayView1<f32>) -> Result<usize> {
        (**self).select_action(state)
    }

    fn learn(&mut self, transition: &Transition<'_, I>) -> Result<()> {
        (**self).learn(transition)
    }
}

impl<I, A: Agent<I> + ?Sized> Agent<I> for Box<A> {
    fn select_action(&mut self, state: ArrayView1<f32>) -> Result<usize> {
        (**self).select_action(state)
    }

    fn learn(&mut self, transition: &Transition<'_, I>) -> Result<()> {
        (**self).learn(transition)
    }
}
