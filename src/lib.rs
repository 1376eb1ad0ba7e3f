//! # Vantage - Episodic Value-Based Reinforcement Learning
//!
//! Vantage runs an agent against a single-agent episodic environment with a
//! discrete action space, and supplies the value-function machinery such an
//! agent learns with: plain and dueling Q-networks that share one contract,
//! plus hard and soft synchronization between an online and a target network.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use vantage::agent::DqnAgent;
//! use vantage::network::{Architecture, NetworkConfig};
//! use vantage::training::{TrainingConfig, TrainingLoop};
//! # use vantage::environment::{Environment, Step};
//! # use ndarray::Array1;
//! # struct Corridor;
//! # impl Environment for Corridor {
//! #     type Info = ();
//! #     fn reset(&mut self) -> vantage::error::Result<Array1<f32>> { Ok(Array1::zeros(4)) }
//! #     fn step(&mut self, _a: usize) -> vantage::error::Result<Step<()>> {
//! #         Ok(Step::new(Array1::zeros(4), 1.0, true, ()))
//! #     }
//! #     fn observation_space(&self) -> usize { 4 }
//! #     fn action_space(&self) -> usize { 2 }
//! # }
//!
//! let network = NetworkConfig::new(4, 2, vec![64, 64]).with_architecture(Architecture::Dueling);
//! let agent = DqnAgent::builder()
//!     .network_config(network)
//!     .build()
//!     .unwrap();
//!
//! let config = TrainingConfig::new(100, 200).with_default_log_file();
//! let mut training = TrainingLoop::new(config, agent, Corridor).unwrap();
//! let report = training.run().unwrap();
//! println!("final average: {}", report.final_average());
//! ```
//!
//! ## Module Organization
//!
//! - [`activations`] - Activation functions (ReLU, linear)
//! - [`agent`] - The agent contract and the reference DQN agent
//! - [`device`] - Compute device selection
//! - [`environment`] - The environment contract
//! - [`error`] - Error types and result handling
//! - [`layers`] - Dense layers and weight initialization
//! - [`loss`] - Loss functions for value regression
//! - [`network`] - Value networks, configuration and synchronization
//! - [`optimizer`] - Optimization algorithms
//! - [`replay_buffer`] - Experience replay
//! - [`training`] - The episodic training loop and reward statistics

pub mod activations;
pub mod agent;
pub mod device;
pub mod environment;
pub mod error;
pub mod layers;
pub mod loss;
pub mod network;
pub mod optimizer;
pub mod replay_buffer;
pub mod training;

#[cfg(test)]
mod tests;
