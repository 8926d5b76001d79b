//! Fully connected layer with flat row-major weights.

use rand::Rng;

use crate::activation::Activation;

/// A dense layer computing `activation(W x + b)`.
///
/// `weights` is row-major with shape `(n_outputs, n_inputs)`: the weight
/// from input `i` to output `o` lives at `o * n_inputs + i`.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Dense {
    pub(crate) n_inputs: usize,
    pub(crate) n_outputs: usize,
    pub(crate) weights: Vec<f64>,
    pub(crate) biases: Vec<f64>,
    pub(crate) activation: Activation,
}

impl Dense {
    /// Create a layer with Glorot-uniform weights and zero biases.
    pub(crate) fn glorot(
        n_inputs: usize,
        n_outputs: usize,
        activation: Activation,
        rng: &mut impl Rng,
    ) -> Self {
        let limit = (6.0 / (n_inputs + n_outputs) as f64).sqrt();
        let weights = (0..n_inputs * n_outputs)
            .map(|_| rng.gen_range(-limit..limit))
            .collect();
        Self {
            n_inputs,
            n_outputs,
            weights,
            biases: vec![0.0; n_outputs],
            activation,
        }
    }

    /// Compute pre-activations `W x + b` into `z`.
    pub(crate) fn pre_activate(&self, input: &[f64], z: &mut Vec<f64>) {
        debug_assert_eq!(input.len(), self.n_inputs);
        z.clear();
        z.extend(self.weights.chunks_exact(self.n_inputs).zip(&self.biases).map(
            |(row, &b)| row.iter().zip(input).map(|(w, x)| w * x).sum::<f64>() + b,
        ));
    }

    /// Forward pass returning the activated outputs.
    #[must_use]
    pub fn forward(&self, input: &[f64]) -> Vec<f64> {
        let mut z = Vec::with_capacity(self.n_outputs);
        self.pre_activate(input, &mut z);
        z.iter().map(|&v| self.activation.apply(v)).collect()
    }

    /// Return the number of inputs.
    #[must_use]
    pub fn n_inputs(&self) -> usize {
        self.n_inputs
    }

    /// Return the number of output units.
    #[must_use]
    pub fn n_outputs(&self) -> usize {
        self.n_outputs
    }

    /// Return the activation function.
    #[must_use]
    pub fn activation(&self) -> Activation {
        self.activation
    }

    /// Total number of trainable parameters.
    #[must_use]
    pub fn n_params(&self) -> usize {
        self.weights.len() + self.biases.len()
    }
}
