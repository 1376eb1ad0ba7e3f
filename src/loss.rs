use ndarray::{Array2, ArrayView2};
use serde::{Deserialize, Serialize};

/// Loss between predicted and target value vectors, reduced by summation over
/// every element of the batch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LossFunction {
    /// `sum((prediction - target)^2)`
    #[default]
    SumSquared,

    /// Smooth L1, quadratic inside `delta` and linear outside.
    Huber { delta: f32 },
}

impl LossFunction {
    /// Compute the scalar loss for a batch of predictions and targets
    pub fn compute_batch(&self, predictions: ArrayView2<f32>, targets: ArrayView2<f32>) -> f32 {
        let diff = &predictions - &targets;
        match *self {
            LossFunction::SumSquared => diff.mapv(|x| x * x).sum(),
            LossFunction::Huber { delta } => diff
                .mapv(|x| {
                    let abs_x = x.abs();
                    if abs_x <= delta {
                        0.5 * x * x
                    } else {
                        delta * abs_x - 0.5 * delta * delta
                    }
                })
                .sum(),
        }
    }

    /// Compute dLoss/dPrediction for a batch
    pub fn gradient_batch(&self, predictions: ArrayView2<f32>, targets: ArrayView2<f32>) -> Array2<f32> {
        let diff = &predictions - &targets;
        match *self {
            LossFunction::SumSquared => diff * 2.0,
            LossFunction::Huber { delta } => diff.mapv(|x| if x.abs() <= delta { x } else { delta * x.signum() }),
        }
    }
}
