//! # Value Networks
//!
//! A value network maps an observation vector to one action-value per
//! discrete action. Two architectures are provided:
//!
//! - [`MlpValueNetwork`]: ReLU hidden layers followed by a linear projection.
//! - [`DuelingValueNetwork`]: a shared ReLU trunk feeding a scalar state-value
//!   head and a per-action advantage head, combined as
//!   `Q(s, a) = V(s) + A(s, a) - mean_a A(s, a)`.
//!
//! Every network owns its optimizer and loss, and exchanges weights with
//! other networks only through owned [`NetworkParameters`] snapshots.
//!
//! ```rust,no_run
//! use vantage::network::{Architecture, NetworkConfig, Synchronization};
//!
//! let config = NetworkConfig::new(4, 2, vec![8]).with_architecture(Architecture::Dueling);
//! let online = config.build().unwrap();
//! let mut target = config.build().unwrap();
//! target.synchronize(online.as_ref(), Synchronization::Hard).unwrap();
//! ```

mod config;
mod dueling;
mod mlp;
mod parameters;

pub use config::{Architecture, NetworkConfig, NetworkFactory};
pub use dueling::{combine_streams, DuelingValueNetwork};
pub use mlp::MlpValueNetwork;
pub use parameters::{LayerParameters, NetworkParameters, Synchronization};

use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};

use crate::device::Device;
use crate::error::{Result, VantageError};
use crate::layers::{DenseLayer, LayerGradients};
use crate::optimizer::{Optimizer, OptimizerWrapper};

/// The contract every action-value approximator satisfies.
pub trait ValueNetwork: Send {
    /// Observation dimensionality.
    fn input_size(&self) -> usize;

    /// Number of discrete actions.
    fn output_size(&self) -> usize;

    /// Device resolved at construction.
    fn device(&self) -> Device;

    /// Evaluate a batch of observations, one row per sample.
    fn forward_batch(&self, observations: ArrayView2<f32>) -> Result<Array2<f32>>;

    /// Evaluate a single observation.
    fn forward(&self, observation: ArrayView1<f32>) -> Result<Array1<f32>> {
        let batch = observation.insert_axis(Axis(0));
        let output = self.forward_batch(batch)?;
        Ok(output.index_axis_move(Axis(0), 0))
    }

    /// One optimization step on the summed loss between predictions and `targets`.
    fn update(&mut self, observations: ArrayView2<f32>, targets: ArrayView2<f32>) -> Result<()>;

    /// Loss measured before the most recent successful `update`.
    fn last_loss(&self) -> Option<f32>;

    /// Owned copy of all parameter tensors.
    fn export_parameters(&self) -> NetworkParameters;

    /// Overwrite all parameter tensors; shapes must match exactly.
    fn import_parameters(&mut self, parameters: &NetworkParameters) -> Result<()>;

    /// Take on the parameters of `source` by hard copy or exponential smoothing.
    fn synchronize(&mut self, source: &dyn ValueNetwork, sync: Synchronization) -> Result<()> {
        let source_parameters = source.export_parameters();
        match sync {
            Synchronization::Hard => self.import_parameters(&source_parameters),
            Synchronization::Soft { smoothing_factor } => {
                let mut current = self.export_parameters();
                current.blend_toward(&source_parameters, smoothing_factor)?;
                self.import_parameters(&current)
            }
        }
    }
}

pub(crate) fn check_observations(input_size: usize, observations: ArrayView2<f32>) -> Result<()> {
    if observations.ncols() != input_size {
        return Err(VantageError::dimension_mismatch(
            format!("observations with {} features", input_size),
            format!("observations with {} features", observations.ncols()),
        ));
    }
    Ok(())
}

pub(crate) fn check_targets(output_size: usize, observations: ArrayView2<f32>, targets: ArrayView2<f32>) -> Result<()> {
    let expected = (observations.nrows(), output_size);
    if targets.dim() != expected {
        return Err(VantageError::dimension_mismatch(format!("{:?}", expected), format!("{:?}", targets.dim())));
    }
    Ok(())
}

pub(crate) fn layer_parameters(layer: &DenseLayer) -> LayerParameters {
    LayerParameters {
        weights: layer.weights.clone(),
        biases: layer.biases.clone(),
    }
}

/// Copy `parameters` into `layers` after checking the layout against the current one.
pub(crate) fn assign_parameters(
    architecture: Architecture,
    layers: &mut [&mut DenseLayer],
    parameters: &NetworkParameters,
) -> Result<()> {
    let current = NetworkParameters {
        architecture,
        layers: layers.iter().map(|l| layer_parameters(l)).collect(),
    };
    current.check_compatible(parameters)?;
    for (layer, source) in layers.iter_mut().zip(&parameters.layers) {
        layer.weights.assign(&source.weights);
        layer.biases.assign(&source.biases);
    }
    Ok(())
}

/// Back-propagate through a stack of layers, returning gradients in layer order.
pub(crate) fn backward_stack(layers: &[DenseLayer], output_errors: Array2<f32>) -> Result<(Array2<f32>, Vec<LayerGradients>)> {
    let mut gradients = Vec::with_capacity(layers.len());
    let mut current_error = output_errors;
    for layer in layers.iter().rev() {
        let (input_error, layer_gradients) = layer.backward_batch(current_error.view())?;
        gradients.push(layer_gradients);
        current_error = input_error;
    }
    gradients.reverse();
    Ok((current_error, gradients))
}

/// Apply one optimizer step; slot `i` is the `i`-th layer in parameter order.
pub(crate) fn apply_gradients(
    optimizer: &mut OptimizerWrapper,
    layers: &mut [&mut DenseLayer],
    gradients: &[LayerGradients],
    learning_rate: f32,
) {
    optimizer.begin_step();
    for (slot, (layer, grads)) in layers.iter_mut().zip(gradients).enumerate() {
        optimizer.update_weights(slot, &mut layer.weights, &grads.weights, learning_rate);
        optimizer.update_biases(slot, &mut layer.biases, &grads.biases, learning_rate);
    }
}
