use ndarray::{array, Array2};

use crate::error::VantageError;
use crate::layers::WeightInit;
use crate::loss::LossFunction;
use crate::network::{
    combine_streams, Architecture, DuelingValueNetwork, NetworkConfig, NetworkParameters, ValueNetwork,
};
use crate::optimizer::OptimizerConfig;

fn dueling(hidden: Vec<usize>) -> DuelingValueNetwork {
    DuelingValueNetwork::new(&NetworkConfig::new(3, 4, hidden).with_seed(9)).unwrap()
}

#[test]
fn test_combine_streams_subtracts_row_mean() {
    let values = array![[1.0], [-2.0]];
    let advantages = array![[1.0, 2.0, 3.0], [4.0, 4.0, 10.0]];

    let q_values = combine_streams(values.view(), advantages.view()).unwrap();

    assert_eq!(q_values, array![[0.0, 1.0, 2.0], [-4.0, -4.0, 2.0]]);
}

#[test]
fn test_combine_streams_ignores_uniform_advantage_shift() {
    let values = array![[0.5]];
    let advantages = array![[0.25, -1.0, 2.0]];
    let shifted = &advantages + 7.0;

    let q = combine_streams(values.view(), advantages.view()).unwrap();
    let q_shifted = combine_streams(values.view(), shifted.view()).unwrap();

    for (a, b) in q.iter().zip(q_shifted.iter()) {
        assert!((a - b).abs() < 1e-5);
    }
}

#[test]
fn test_combine_streams_checks_value_shape() {
    let values = Array2::<f32>::zeros((2, 2));
    let advantages = Array2::<f32>::zeros((2, 3));
    assert!(matches!(
        combine_streams(values.view(), advantages.view()),
        Err(VantageError::DimensionMismatch { .. })
    ));
}

#[test]
fn test_forward_is_combined_streams() {
    let network = dueling(vec![6, 5]);
    let observations = array![[0.3, -0.1, 0.8], [1.0, 0.0, -1.0]];

    let (values, advantages) = network.streams(observations.view()).unwrap();
    assert_eq!(values.dim(), (2, 1));
    assert_eq!(advantages.dim(), (2, 4));

    let expected = combine_streams(values.view(), advantages.view()).unwrap();
    assert_eq!(network.forward_batch(observations.view()).unwrap(), expected);
}

#[test]
fn test_q_minus_mean_q_is_centered_advantage() {
    let network = dueling(vec![6]);
    let observations = array![[0.3, -0.1, 0.8]];
    let (values, _) = network.streams(observations.view()).unwrap();
    let q = network.forward_batch(observations.view()).unwrap();

    // mean over actions of Q equals V because the advantages are centered
    let mean_q = q.row(0).mean().unwrap();
    assert!((mean_q - values[[0, 0]]).abs() < 1e-5);
}

#[test]
fn test_trunk_features_are_rectified() {
    let network = dueling(vec![6, 5]);
    let features = network.trunk_features(array![[5.0, -3.0, 2.0]].view()).unwrap();
    assert_eq!(features.dim(), (1, 5));
    assert!(features.iter().all(|&f| f >= 0.0));
}

#[test]
fn test_parameter_layout() {
    let network = dueling(vec![6, 5]);
    let parameters = network.export_parameters();
    assert_eq!(
        parameters.shapes(),
        vec![((3, 6), 6), ((6, 5), 5), ((5, 1), 1), ((5, 4), 4)]
    );
    assert_eq!(parameters.num_parameters(), 24 + 35 + 6 + 24);
}

#[test]
fn test_plain_parameters_do_not_fit_dueling() {
    let plain = NetworkConfig::new(3, 4, vec![6]).build().unwrap();
    let mut network = dueling(vec![6]);

    let result = network.import_parameters(&plain.export_parameters());

    assert!(matches!(result, Err(VantageError::ArchitectureMismatch(_))));
}

#[test]
fn test_factory_builds_dueling() {
    let network = NetworkConfig::new(3, 4, vec![6])
        .with_architecture(Architecture::Dueling)
        .build()
        .unwrap();
    assert_eq!(network.export_parameters().layers.len(), 3);
}

fn sgd_network(architecture: Architecture) -> Box<dyn ValueNetwork> {
    // a unit learning rate makes one SGD step subtract exactly the gradient
    NetworkConfig::new(3, 3, vec![5, 4])
        .with_architecture(architecture)
        .with_optimizer(OptimizerConfig::Sgd)
        .with_learning_rate(1.0)
        .with_weight_init(WeightInit::XavierUniform)
        .with_seed(21)
        .build()
        .unwrap()
}

fn flatten(parameters: &NetworkParameters) -> Vec<f32> {
    parameters
        .layers
        .iter()
        .flat_map(|layer| layer.weights.iter().chain(layer.biases.iter()).copied())
        .collect()
}

fn batch_loss(network: &dyn ValueNetwork, observations: &Array2<f32>, targets: &Array2<f32>) -> f32 {
    let predictions = network.forward_batch(observations.view()).unwrap();
    LossFunction::SumSquared.compute_batch(predictions.view(), targets.view())
}

/// Central-difference gradient of the batch loss, flattened in the same
/// order as [`flatten`].
fn numerical_gradient(
    network: &mut dyn ValueNetwork,
    observations: &Array2<f32>,
    targets: &Array2<f32>,
    epsilon: f32,
) -> Vec<f32> {
    let base = network.export_parameters();
    let mut gradient = Vec::new();

    for layer in 0..base.layers.len() {
        let num_weights = base.layers[layer].weights.len();
        let num_biases = base.layers[layer].biases.len();
        for index in 0..num_weights + num_biases {
            let mut losses = [0.0; 2];
            for (slot, delta) in [epsilon, -epsilon].iter().enumerate() {
                let mut perturbed = base.clone();
                let entry = if index < num_weights {
                    &mut perturbed.layers[layer].weights.as_slice_mut().unwrap()[index]
                } else {
                    &mut perturbed.layers[layer].biases.as_slice_mut().unwrap()[index - num_weights]
                };
                *entry += *delta;
                network.import_parameters(&perturbed).unwrap();
                losses[slot] = batch_loss(network, observations, targets);
            }
            gradient.push((losses[0] - losses[1]) / (2.0 * epsilon));
        }
    }

    network.import_parameters(&base).unwrap();
    gradient
}

fn relative_error(analytic: &[f32], numerical: &[f32]) -> f32 {
    let difference: f32 = analytic.iter().zip(numerical).map(|(a, n)| (a - n).powi(2)).sum();
    let magnitude: f32 = analytic.iter().zip(numerical).map(|(a, n)| (a + n).powi(2)).sum();
    difference.sqrt() / magnitude.sqrt().max(1e-12)
}

#[test]
fn test_update_follows_numerical_gradient() {
    let observations = array![[0.4, -0.7, 0.9], [-0.2, 0.5, 0.3], [1.1, 0.1, -0.6]];
    let targets = array![[1.0, -0.5, 0.25], [0.0, 0.75, -1.0], [0.5, 0.5, 2.0]];

    for architecture in [Architecture::Plain, Architecture::Dueling] {
        let mut network = sgd_network(architecture);
        let numerical = numerical_gradient(network.as_mut(), &observations, &targets, 1e-2);

        let before = flatten(&network.export_parameters());
        network.update(observations.view(), targets.view()).unwrap();
        let after = flatten(&network.export_parameters());
        let analytic: Vec<f32> = before.iter().zip(&after).map(|(b, a)| b - a).collect();

        assert_eq!(analytic.len(), numerical.len());
        let error = relative_error(&analytic, &numerical);
        assert!(error < 2e-2, "{:?}: relative gradient error {}", architecture, error);
    }
}

#[test]
fn test_advantage_bias_step_is_centered() {
    let mut network = sgd_network(Architecture::Dueling);
    let observations = array![[0.4, -0.7, 0.9], [-0.2, 0.5, 0.3]];
    let targets = array![[3.0, -1.0, 0.5], [2.0, 2.0, -4.0]];

    let before = network.export_parameters();
    network.update(observations.view(), targets.view()).unwrap();
    let after = network.export_parameters();

    // parameter order is trunk, value head, advantage head
    let count = before.layers.len();
    let advantage_step = &before.layers[count - 1].biases - &after.layers[count - 1].biases;
    let value_step = &before.layers[count - 2].biases - &after.layers[count - 2].biases;

    assert!(advantage_step.sum().abs() < 1e-4, "advantage bias step {:?}", advantage_step);
    assert!(advantage_step.iter().any(|step| step.abs() > 1e-3));
    assert!(value_step[0].abs() > 1e-3);
}
