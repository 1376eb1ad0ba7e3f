use std::fs;
use std::path::Path;

use log::info;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

use super::Architecture;
use crate::error::{Result, VantageError};

/// Weights and biases of one affine layer.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct LayerParameters {
    pub weights: Array2<f32>,
    pub biases: Array1<f32>,
}

/// A full, owned snapshot of a network's parameter tensors in layer order.
///
/// Snapshots are the unit of weight transfer: exporting, importing,
/// checkpointing and target-network synchronization all go through them, so
/// two networks never share parameter storage.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct NetworkParameters {
    /// Kind of network the snapshot was exported from.
    pub architecture: Architecture,
    pub layers: Vec<LayerParameters>,
}

impl NetworkParameters {
    /// `(weights shape, bias length)` for every layer.
    pub fn shapes(&self) -> Vec<((usize, usize), usize)> {
        self.layers.iter().map(|l| (l.weights.dim(), l.biases.len())).collect()
    }

    /// Total number of scalar parameters.
    pub fn num_parameters(&self) -> usize {
        self.layers.iter().map(|l| l.weights.len() + l.biases.len()).sum()
    }

    /// Fail unless `other` comes from the same architecture with exactly the
    /// same layer count and tensor shapes.
    pub fn check_compatible(&self, other: &NetworkParameters) -> Result<()> {
        if self.architecture != other.architecture {
            return Err(VantageError::ArchitectureMismatch(format!(
                "expected {:?} parameters, got {:?}",
                self.architecture, other.architecture
            )));
        }
        if self.layers.len() != other.layers.len() {
            return Err(VantageError::ArchitectureMismatch(format!(
                "expected {} parameter layers, got {}",
                self.layers.len(),
                other.layers.len()
            )));
        }
        for (i, (ours, theirs)) in self.shapes().into_iter().zip(other.shapes()).enumerate() {
            if ours != theirs {
                return Err(VantageError::ArchitectureMismatch(format!(
                    "layer {} expected weights {:?} / biases {}, got weights {:?} / biases {}",
                    i, ours.0, ours.1, theirs.0, theirs.1
                )));
            }
        }
        Ok(())
    }

    /// Element-wise `self = smoothing_factor * self + (1 - smoothing_factor) * source`.
    ///
    /// A factor near 1 keeps most of the current values; a factor near 0
    /// adopts most of `source`.
    pub fn blend_toward(&mut self, source: &NetworkParameters, smoothing_factor: f32) -> Result<()> {
        validate_smoothing_factor(smoothing_factor)?;
        self.check_compatible(source)?;

        let keep = smoothing_factor;
        let adopt = 1.0 - smoothing_factor;
        for (target, source) in self.layers.iter_mut().zip(&source.layers) {
            target.weights.zip_mut_with(&source.weights, |t, &s| *t = keep * *t + adopt * s);
            target.biases.zip_mut_with(&source.biases, |t, &s| *t = keep * *t + adopt * s);
        }
        Ok(())
    }

    /// Euclidean distance between two compatible parameter sets.
    pub fn distance(&self, other: &NetworkParameters) -> Result<f32> {
        self.check_compatible(other)?;
        let squared: f32 = self
            .layers
            .iter()
            .zip(&other.layers)
            .map(|(a, b)| {
                let w: f32 = a.weights.iter().zip(b.weights.iter()).map(|(x, y)| (x - y) * (x - y)).sum();
                let bias: f32 = a.biases.iter().zip(b.biases.iter()).map(|(x, y)| (x - y) * (x - y)).sum();
                w + bias
            })
            .sum();
        Ok(squared.sqrt())
    }

    /// Persist the snapshot with bincode.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let serialized = bincode::serialize(self)?;
        fs::write(path.as_ref(), serialized)?;
        info!("Save network parameters to {:?}", path.as_ref());
        Ok(())
    }

    /// Load a snapshot written by [`NetworkParameters::save`].
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = fs::read(path.as_ref())?;
        let parameters = bincode::deserialize(&data)?;
        info!("Load network parameters from {:?}", path.as_ref());
        Ok(parameters)
    }
}

pub(crate) fn validate_smoothing_factor(smoothing_factor: f32) -> Result<()> {
    if !(0.0..=1.0).contains(&smoothing_factor) {
        return Err(VantageError::invalid_parameter(
            "smoothing_factor".to_string(),
            format!("must lie in [0, 1], got {}", smoothing_factor),
        ));
    }
    Ok(())
}

/// How a network takes on the parameters of another network of the same shape.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Synchronization {
    /// Copy every tensor verbatim.
    Hard,
    /// `new = smoothing_factor * current + (1 - smoothing_factor) * source`.
    Soft { smoothing_factor: f32 },
}
