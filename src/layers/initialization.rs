use ndarray::{Array1, Array2};
use ndarray_rand::RandomExt;
use rand_distr::Uniform;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{Result, VantageError};

/// Weight initialization strategies
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeightInit {
    /// Uniform distribution with custom range
    Uniform { min: f32, max: f32 },

    /// Xavier/Glorot uniform initialization
    XavierUniform,

    /// He/Kaiming uniform initialization (for ReLU)
    HeUniform,

    /// All zeros
    Zeros,
}

impl Default for WeightInit {
    fn default() -> Self {
        WeightInit::Uniform { min: -0.1, max: 0.1 }
    }
}

impl WeightInit {
    pub fn validate(&self) -> Result<()> {
        if let WeightInit::Uniform { min, max } = self {
            if !(min.is_finite() && max.is_finite() && min < max) {
                return Err(VantageError::invalid_parameter(
                    "weight_init".to_string(),
                    format!("uniform range [{}, {}) is empty or not finite", min, max),
                ));
            }
        }
        Ok(())
    }

    /// Initialize a `(fan_in, fan_out)` weight matrix, drawing from `rng`.
    pub fn initialize_weights<R: Rng + ?Sized>(&self, shape: (usize, usize), rng: &mut R) -> Array2<f32> {
        let (fan_in, fan_out) = shape;

        match self {
            WeightInit::Uniform { min, max } => Array2::random_using(shape, Uniform::new(*min, *max), rng),

            WeightInit::XavierUniform => {
                let limit = (6.0 / (fan_in + fan_out) as f32).sqrt();
                Array2::random_using(shape, Uniform::new(-limit, limit), rng)
            }

            WeightInit::HeUniform => {
                let limit = (6.0 / fan_in as f32).sqrt();
                Array2::random_using(shape, Uniform::new(-limit, limit), rng)
            }

            WeightInit::Zeros => Array2::zeros(shape),
        }
    }

    /// Biases always start at zero.
    pub fn initialize_biases(&self, size: usize) -> Array1<f32> {
        Array1::zeros(size)
    }
}
