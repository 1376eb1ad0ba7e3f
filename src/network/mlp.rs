use log::{debug, trace};
use ndarray::{Array2, ArrayView2};

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

/// A plain multilayer perceptron: ReLU after every hidden layer, then a
/// linear projection to one value per action.
#[derive(Clone, Debug)]
pub struct MlpValueNetwork {
    layers: Vec<DenseLayer>,
    optimizer: OptimizerWrapper,
    loss: LossFunction,
    learning_rate: f32,
    device: Device,
    last_loss: Option<f32>,
}

impl MlpValueNetwork {
    pub fn new(config: &NetworkConfig) -> Result<Self> {
        config.validate()?;
        let mut rng = config.rng();
        let device = config.device.resolve();

        let mut sizes = Vec::with_capacity(config.hidden_layers_sizes.len() + 2);
        sizes.push(config.input_shape);
        sizes.extend_from_slice(&config.hidden_layers_sizes);
        sizes.push(config.output_shape);

        let last = sizes.len() - 2;
        let layers = sizes
            .windows(2)
            .enumerate()
            .map(|(i, window)| {
                let activation = if i == last { Activation::Linear } else { Activation::Relu };
                DenseLayer::new(window[0], window[1], activation, &config.weight_init, &mut rng)
            })
            .collect::<Vec<_>>();

        debug!("Built mlp value network with layer sizes {:?} on {:?}", sizes, device);

        Ok(MlpValueNetwork {
            layers,
            optimizer: config.optimizer.build(),
            loss: config.loss,
            learning_rate: config.learning_rate,
            device,
            last_loss: None,
        })
    }

    pub fn layers(&self) -> &[DenseLayer] {
        &self.layers
    }

    pub fn learning_rate(&self) -> f32 {
        self.learning_rate
    }

    fn forward_cached(&mut self, observations: ArrayView2<f32>) -> Array2<f32> {
        let mut current_output = observations.to_owned();
        for layer in &mut self.layers {
            current_output = layer.forward_batch(current_output.view());
        }
        current_output
    }

    fn clear_caches(&mut self) {
        self.layers.iter_mut().for_each(DenseLayer::clear_cache);
    }
}

impl ValueNetwork for MlpValueNetwork {
    fn input_size(&self) -> usize {
        self.layers[0].input_size()
    }

    fn output_size(&self) -> usize {
        self.layers[self.layers.len() - 1].output_size()
    }

    fn device(&self) -> Device {
        self.device
    }

    fn forward_batch(&self, observations: ArrayView2<f32>) -> Result<Array2<f32>> {
        check_observations(self.input_size(), observations)?;
        let mut current_output = observations.to_owned();
        for layer in &self.layers {
            current_output = layer.infer_batch(current_output.view());
        }
        Ok(current_output)
    }

    fn update(&mut self, observations: ArrayView2<f32>, targets: ArrayView2<f32>) -> Result<()> {
        check_observations(self.input_size(), observations)?;
        check_targets(self.output_size(), observations, targets)?;

        let predictions = self.forward_cached(observations);
        let loss = self.loss.compute_batch(predictions.view(), targets);
        if !loss.is_finite() {
            self.clear_caches();
            return Err(VantageError::NumericalError(format!("non-finite loss {}", loss)));
        }

        let output_errors = self.loss.gradient_batch(predictions.view(), targets);
        let (_, gradients) = backward_stack(&self.layers, output_errors)?;

        let mut layers: Vec<&mut DenseLayer> = self.layers.iter_mut().collect();
        apply_gradients(&mut self.optimizer, &mut layers, &gradients, self.learning_rate);
        self.clear_caches();

        trace!("MlpValueNetwork::update() batch={} loss={}", observations.nrows(), loss);
        self.last_loss = Some(loss);
        Ok(())
    }

    fn last_loss(&self) -> Option<f32> {
        self.last_loss
    }

    fn export_parameters(&self) -> NetworkParameters {
        NetworkParameters {
            architecture: Architecture::Plain,
            layers: self.layers.iter().map(layer_parameters).collect(),
        }
    }

    fn import_parameters(&mut self, parameters: &NetworkParameters) -> Result<()> {
        let mut layers: Vec<&mut DenseLayer> = self.layers.iter_mut().collect();
        assign_parameters(Architecture::Plain, &mut layers, parameters)
    }
}
