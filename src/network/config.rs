use std::fs;
use std::path::Path;

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use super::{DuelingValueNetwork, MlpValueNetwork, ValueNetwork};
use crate::device::Device;
use crate::error::{Result, VantageError};
use crate::layers::WeightInit;
use crate::loss::LossFunction;
use crate::optimizer::OptimizerConfig;

fn default_learning_rate() -> f32 {
    1e-4
}

/// Construction parameters shared by every value-network architecture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkConfig {
    pub input_shape: usize,
    pub output_shape: usize,
    pub hidden_layers_sizes: Vec<usize>,
    #[serde(default)]
    pub device: Device,
    #[serde(default = "default_learning_rate")]
    pub learning_rate: f32,
    #[serde(default)]
    pub architecture: Architecture,
    #[serde(default)]
    pub optimizer: OptimizerConfig,
    #[serde(default)]
    pub loss: LossFunction,
    #[serde(default)]
    pub weight_init: WeightInit,
    /// Seed for weight initialization; `None` draws from OS entropy.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl NetworkConfig {
    pub fn new(input_shape: usize, output_shape: usize, hidden_layers_sizes: Vec<usize>) -> Self {
        NetworkConfig {
            input_shape,
            output_shape,
            hidden_layers_sizes,
            device: Device::default(),
            learning_rate: default_learning_rate(),
            architecture: Architecture::default(),
            optimizer: OptimizerConfig::default(),
            loss: LossFunction::default(),
            weight_init: WeightInit::default(),
            seed: None,
        }
    }

    pub fn with_device(mut self, device: Device) -> Self {
        self.device = device;
        self
    }

    pub fn with_learning_rate(mut self, learning_rate: f32) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    pub fn with_architecture(mut self, architecture: Architecture) -> Self {
        self.architecture = architecture;
        self
    }

    pub fn with_optimizer(mut self, optimizer: OptimizerConfig) -> Self {
        self.optimizer = optimizer;
        self
    }

    pub fn with_loss(mut self, loss: LossFunction) -> Self {
        self.loss = loss;
        self
    }

    pub fn with_weight_init(mut self, weight_init: WeightInit) -> Self {
        self.weight_init = weight_init;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Check every precondition on the architecture before any tensor is allocated.
    pub fn validate(&self) -> Result<()> {
        if self.input_shape == 0 {
            return Err(VantageError::invalid_parameter("input_shape", "must be positive"));
        }
        if self.output_shape == 0 {
            return Err(VantageError::invalid_parameter("output_shape", "must be positive"));
        }
        if self.hidden_layers_sizes.is_empty() {
            return Err(VantageError::ArchitectureMismatch(
                "hidden_layers_sizes must name at least one hidden layer".to_string(),
            ));
        }
        if let Some(i) = self.hidden_layers_sizes.iter().position(|&size| size == 0) {
            return Err(VantageError::invalid_parameter(
                "hidden_layers_sizes".to_string(),
                format!("hidden layer {} has zero units", i),
            ));
        }
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return Err(VantageError::invalid_parameter(
                "learning_rate".to_string(),
                format!("must be a positive finite number, got {}", self.learning_rate),
            ));
        }
        if let LossFunction::Huber { delta } = self.loss {
            if !(delta.is_finite() && delta > 0.0) {
                return Err(VantageError::invalid_parameter(
                    "loss".to_string(),
                    format!("huber delta must be positive, got {}", delta),
                ));
            }
        }
        self.weight_init.validate()
    }

    pub(crate) fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }

    /// Build the network selected by `architecture`.
    pub fn build(&self) -> Result<Box<dyn ValueNetwork>> {
        self.architecture.build(self)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&data)?;
        config.validate()?;
        Ok(config)
    }
}

/// Anything that can construct value networks from a configuration.
///
/// Agents hold a factory rather than a concrete network type so the
/// architecture is chosen by configuration.
pub trait NetworkFactory: Send {
    fn build(&self, config: &NetworkConfig) -> Result<Box<dyn ValueNetwork>>;
}

/// Built-in value-network architectures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Architecture {
    #[default]
    Plain,
    Dueling,
}

impl NetworkFactory for Architecture {
    fn build(&self, config: &NetworkConfig) -> Result<Box<dyn ValueNetwork>> {
        match self {
            Architecture::Plain => Ok(Box::new(MlpValueNetwork::new(config)?)),
            Architecture::Dueling => Ok(Box::new(DuelingValueNetwork::new(config)?)),
        }
    }
}
