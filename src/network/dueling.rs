use log::{debug, trace};
use ndarray::{Array2, ArrayView2, Axis};

use super::{
    apply_gradients, assign_parameters, backward_stack, check_observations, check_targets, layer_parameters,
    Architecture, NetworkConfig, NetworkParameters, ValueNetwork,
};
use crate::activations::Activation;
use crate::device::Device;
use crate::error::{Result, VantageError};
use crate::layers::DenseLayer;
use crate::loss::LossFunction;
use crate::optimizer::OptimizerWrapper;

/// Combine a state-value column `(batch, 1)` with advantages `(batch, actions)`:
/// `Q(s, a) = V(s) + A(s, a) - mean_a A(s, a)`.
///
/// The mean is taken per row, over the action dimension.
pub fn combine_streams(values: ArrayView2<f32>, advantages: ArrayView2<f32>) -> Result<Array2<f32>> {
    if values.dim() != (advantages.nrows(), 1) {
        return Err(VantageError::dimension_mismatch(
            format!("({}, 1)", advantages.nrows()),
            format!("{:?}", values.dim()),
        ));
    }
    let mean = advantages
        .mean_axis(Axis(1))
        .ok_or_else(|| VantageError::invalid_parameter("advantages", "advantage head has no actions"))?
        .insert_axis(Axis(1));
    Ok(&advantages - &mean + &values)
}

/// Dueling architecture: a shared ReLU trunk feeding a value head `V(s)` and
/// an advantage head `A(s, a)`.
///
/// Parameter order is trunk layers, then the value head, then the advantage head.
#[derive(Clone, Debug)]
pub struct DuelingValueNetwork {
    trunk: Vec<DenseLayer>,
    value_head: DenseLayer,
    advantage_head: DenseLayer,
    optimizer: OptimizerWrapper,
    loss: LossFunction,
    learning_rate: f32,
    device: Device,
    last_loss: Option<f32>,
}

impl DuelingValueNetwork {
    pub fn new(config: &NetworkConfig) -> Result<Self> {
        config.validate()?;
        let mut rng = config.rng();
        let device = config.device.resolve();

        let mut trunk = Vec::with_capacity(config.hidden_layers_sizes.len());
        let mut input_size = config.input_shape;
        for &hidden in &config.hidden_layers_sizes {
            trunk.push(DenseLayer::new(input_size, hidden, Activation::Relu, &config.weight_init, &mut rng));
            input_size = hidden;
        }
        let value_head = DenseLayer::new(input_size, 1, Activation::Linear, &config.weight_init, &mut rng);
        let advantage_head =
            DenseLayer::new(input_size, config.output_shape, Activation::Linear, &config.weight_init, &mut rng);

        debug!(
            "Built dueling value network {} -> {:?} -> (1, {}) on {:?}",
            config.input_shape, config.hidden_layers_sizes, config.output_shape, device
        );

        Ok(DuelingValueNetwork {
            trunk,
            value_head,
            advantage_head,
            optimizer: config.optimizer.build(),
            loss: config.loss,
            learning_rate: config.learning_rate,
            device,
            last_loss: None,
        })
    }

    /// Hidden features shared by both heads.
    pub fn trunk_features(&self, observations: ArrayView2<f32>) -> Result<Array2<f32>> {
        check_observations(self.input_size(), observations)?;
        let mut features = observations.to_owned();
        for layer in &self.trunk {
            features = layer.infer_batch(features.view());
        }
        Ok(features)
    }

    /// State-value and advantage streams before they are combined.
    pub fn streams(&self, observations: ArrayView2<f32>) -> Result<(Array2<f32>, Array2<f32>)> {
        let features = self.trunk_features(observations)?;
        Ok((
            self.value_head.infer_batch(features.view()),
            self.advantage_head.infer_batch(features.view()),
        ))
    }

    fn parameter_layers_mut(&mut self) -> Vec<&mut DenseLayer> {
        let mut layers: Vec<&mut DenseLayer> = self.trunk.iter_mut().collect();
        layers.push(&mut self.value_head);
        layers.push(&mut self.advantage_head);
        layers
    }

    fn clear_caches(&mut self) {
        self.parameter_layers_mut().into_iter().for_each(|layer| layer.clear_cache());
    }
}

impl ValueNetwork for DuelingValueNetwork {
    fn input_size(&self) -> usize {
        self.trunk[0].input_size()
    }

    fn output_size(&self) -> usize {
        self.advantage_head.output_size()
    }

    fn device(&self) -> Device {
        self.device
    }

    fn forward_batch(&self, observations: ArrayView2<f32>) -> Result<Array2<f32>> {
        let (values, advantages) = self.streams(observations)?;
        combine_streams(values.view(), advantages.view())
    }

    fn update(&mut self, observations: ArrayView2<f32>, targets: ArrayView2<f32>) -> Result<()> {
        check_observations(self.input_size(), observations)?;
        check_targets(self.output_size(), observations, targets)?;

        let mut features = observations.to_owned();
        for layer in &mut self.trunk {
            features = layer.forward_batch(features.view());
        }
        let values = self.value_head.forward_batch(features.view());
        let advantages = self.advantage_head.forward_batch(features.view());
        let predictions = combine_streams(values.view(), advantages.view())?;

        let loss = self.loss.compute_batch(predictions.view(), targets);
        if !loss.is_finite() {
            self.clear_caches();
            return Err(VantageError::NumericalError(format!("non-finite loss {}", loss)));
        }

        // dQ/dV = 1 for every action; dQ_j/dA_k = [j == k] - 1/n
        let q_errors = self.loss.gradient_batch(predictions.view(), targets);
        let value_errors = q_errors.sum_axis(Axis(1)).insert_axis(Axis(1));
        let mean_errors = q_errors
            .mean_axis(Axis(1))
            .ok_or_else(|| VantageError::TrainingError("empty advantage gradient".to_string()))?
            .insert_axis(Axis(1));
        let advantage_errors = &q_errors - &mean_errors;

        let (value_input_errors, value_gradients) = self.value_head.backward_batch(value_errors.view())?;
        let (advantage_input_errors, advantage_gradients) =
            self.advantage_head.backward_batch(advantage_errors.view())?;
        let feature_errors = value_input_errors + &advantage_input_errors;
        let (_, mut gradients) = backward_stack(&self.trunk, feature_errors)?;
        gradients.push(value_gradients);
        gradients.push(advantage_gradients);

        {
            let DuelingValueNetwork {
                trunk,
                value_head,
                advantage_head,
                optimizer,
                learning_rate,
                ..
            } = self;
            let mut layers: Vec<&mut DenseLayer> = trunk.iter_mut().collect();
            layers.push(value_head);
            layers.push(advantage_head);
            apply_gradients(optimizer, &mut layers, &gradients, *learning_rate);
        }
        self.clear_caches();

        trace!("DuelingValueNetwork::update() batch={} loss={}", observations.nrows(), loss);
        self.last_loss = Some(loss);
        Ok(())
    }

    fn last_loss(&self) -> Option<f32> {
        self.last_loss
    }

    fn export_parameters(&self) -> NetworkParameters {
        let mut layers: Vec<_> = self.trunk.iter().map(layer_parameters).collect();
        layers.push(layer_parameters(&self.value_head));
        layers.push(layer_parameters(&self.advantage_head));
        NetworkParameters {
            architecture: Architecture::Dueling,
            layers,
        }
    }

    fn import_parameters(&mut self, parameters: &NetworkParameters) -> Result<()> {
        let mut layers = self.parameter_layers_mut();
        assign_parameters(Architecture::Dueling, &mut layers, parameters)
    }
}
