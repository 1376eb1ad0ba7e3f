//! Train a dueling DQN agent on a one-dimensional corridor.
//!
//! The agent starts at the left end and is paid 1 for reaching the right end.
//! Run with `cargo run --example corridor_dueling`.

use ndarray::Array1;
use vantage::agent::{DqnAgentBuilder, EpsilonSchedule, TargetUpdate};
use vantage::environment::{Environment, Step};
use vantage::error::{Result, VantageError};
use vantage::network::{Architecture, NetworkConfig};
use vantage::training::{TrainingConfig, TrainingLoop, TruncationPolicy};

struct Corridor {
    length: usize,
    position: usize,
}

impl Corridor {
    fn observation(&self) -> Array1<f32> {
        let mut observation = Array1::zeros(self.length);
        observation[self.position] = 1.0;
        observation
    }
}

impl Environment for Corridor {
    type Info = ();

    fn reset(&mut self) -> Result<Array1<f32>> {
        self.position = 0;
        Ok(self.observation())
    }

    fn step(&mut self, action: usize) -> Result<Step<()>> {
        match action {
            0 => self.position = self.position.saturating_sub(1),
            1 => self.position += 1,
            _ => return Err(VantageError::InvalidAction { action, max_actions: 2 }),
        }
        let done = self.position == self.length - 1;
        let reward = if done { 1.0 } else { -0.01 };
        Ok(Step::new(self.observation(), reward, done, ()))
    }

    fn observation_space(&self) -> usize {
        self.length
    }

    fn action_space(&self) -> usize {
        2
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let network = NetworkConfig::new(10, 2, vec![32, 32])
        .with_architecture(Architecture::Dueling)
        .with_learning_rate(1e-3)
        .with_seed(42);
    let agent = DqnAgentBuilder::new()
        .network_config(network)
        .epsilon(EpsilonSchedule { start: 1.0, end: 0.05, decay: 0.995 })
        .gamma(0.95)
        .target_update(TargetUpdate::Soft { smoothing_factor: 0.99 })
        .terminal_on_truncation(false)
        .replay(5_000, 32)
        .seed(42)
        .build()?;

    let config = TrainingConfig::new(200, 100)
        .with_average_reward_steps(20)
        .with_default_log_file()
        .with_truncation_policy(TruncationPolicy::Signal)
        .with_verbose(true);

    let mut training = TrainingLoop::new(config, agent, Corridor { length: 10, position: 0 })?;
    let report = training.run()?;

    println!(
        "{} episodes, {} steps, final rolling average {:.3}",
        report.episodes.len(),
        report.total_steps,
        report.final_average()
    );
    report.history.save_json("rewards.json")?;
    training.agent().save("corridor_dueling.bin")?;
    Ok(())
}
