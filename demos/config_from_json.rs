//! Build the network and the training loop from JSON configuration files.
//!
//! Usage: `cargo run --example config_from_json [network.json] [training.json]`.
//! Defaults to the files under `demos/configs/`.

use std::env;
use std::path::PathBuf;

use log::info;
use ndarray::Array1;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use vantage::agent::DqnAgentBuilder;
use vantage::environment::{Environment, Step};
use vantage::error::{Result, VantageError};
use vantage::network::NetworkConfig;
use vantage::training::{TrainingConfig, TrainingLoop};

/// Balance a noisy scalar near zero; episodes end when it drifts past 1.
struct Drift {
    state: Array1<f32>,
    rng: StdRng,
}

impl Environment for Drift {
    type Info = f32;

    fn reset(&mut self) -> Result<Array1<f32>> {
        self.state = Array1::zeros(4);
        Ok(self.state.clone())
    }

    fn step(&mut self, action: usize) -> Result<Step<f32>> {
        let push = match action {
            0 => -0.05,
            1 => 0.05,
            _ => return Err(VantageError::InvalidAction { action, max_actions: 2 }),
        };
        let noise: f32 = self.rng.gen_range(-0.1..0.1);
        let position = self.state[0] + push + noise;
        self.state = ndarray::arr1(&[position, push, noise, position.abs()]);
        let done = position.abs() > 1.0;
        let reward = if done { -1.0 } else { 1.0 };
        Ok(Step::new(self.state.clone(), reward, done, position))
    }

    fn observation_space(&self) -> usize {
        4
    }

    fn action_space(&self) -> usize {
        2
    }
}

fn config_path(arg: Option<String>, default: &str) -> PathBuf {
    arg.map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("demos/configs").join(default))
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut args = env::args().skip(1);
    let network_path = config_path(args.next(), "network.json");
    let training_path = config_path(args.next(), "training.json");

    let network = NetworkConfig::from_json_file(&network_path)?;
    let training = TrainingConfig::from_json_file(&training_path)?;
    info!("Network config: {:?}", network);
    info!("Training config: {:?}", training);

    let agent = DqnAgentBuilder::new().network_config(network).replay(10_000, 32).build()?;
    let env = Drift {
        state: Array1::zeros(4),
        rng: StdRng::seed_from_u64(0),
    };

    let report = TrainingLoop::new(training, agent, env)?.run()?;
    println!("final rolling average {:.3}", report.final_average());
    Ok(())
}
