//! Feed-forward network and prediction methods.

use rand::Rng;
use rayon::iter::{IntoParallelIterator, ParallelIterator};

use crate::activation::Activation;
use crate::error::NnError;
use crate::layer::Dense;

/// A fitted multi-layer perceptron regressor with a single linear output.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Mlp {
    pub(crate) n_inputs: usize,
    pub(crate) layers: Vec<Dense>,
}

impl Mlp {
    /// Build an untrained network: ReLU hidden layers then one linear unit.
    pub(crate) fn initialize(n_inputs: usize, hidden: &[usize], rng: &mut impl Rng) -> Self {
        let mut layers = Vec::with_capacity(hidden.len() + 1);
        let mut fan_in = n_inputs;
        for &width in hidden {
            layers.push(Dense::glorot(fan_in, width, Activation::Relu, rng));
            fan_in = width;
        }
        layers.push(Dense::glorot(fan_in, 1, Activation::Linear, rng));
        Self { n_inputs, layers }
    }

    /// Predict the scalar output for a single sample.
    ///
    /// # Errors
    ///
    /// Returns [`NnError::PredictionFeatureMismatch`] when `sample.len() != n_inputs`.
    pub fn predict(&self, sample: &[f64]) -> Result<f64, NnError> {
        if sample.len() != self.n_inputs {
            return Err(NnError::PredictionFeatureMismatch {
                expected: self.n_inputs,
                got: sample.len(),
            });
        }
        Ok(self.forward_unchecked(sample))
    }

    /// Predict a batch of samples in parallel.
    ///
    /// # Errors
    ///
    /// Returns [`NnError::PredictionFeatureMismatch`] if any sample has the wrong width.
    pub fn predict_batch(&self, features: &[Vec<f64>]) -> Result<Vec<f64>, NnError> {
        features
            .into_par_iter()
            .map(|sample| self.predict(sample))
            .collect()
    }

    pub(crate) fn forward_unchecked(&self, sample: &[f64]) -> f64 {
        let mut activations = sample.to_vec();
        for layer in &self.layers {
            activations = layer.forward(&activations);
        }
        activations[0]
    }

    /// Return the input width.
    #[must_use]
    pub fn n_inputs(&self) -> usize {
        self.n_inputs
    }

    /// Return the layers, input side first.
    #[must_use]
    pub fn layers(&self) -> &[Dense] {
        &self.layers
    }

    /// Return the output width of every layer, input side first.
    #[must_use]
    pub fn layer_widths(&self) -> Vec<usize> {
        self.layers.iter().map(Dense::n_outputs).collect()
    }

    /// Total number of trainable parameters.
    #[must_use]
    pub fn n_params(&self) -> usize {
        self.layers.iter().map(Dense::n_params).sum()
    }
}
