//! Configuration builder for regressor training.

use crate::error::NnError;
use crate::result::{EpochReport, TrainingResult};

/// Configuration for training an [`Mlp`](crate::Mlp) regressor.
///
/// Construct via [`MlpConfig::new`], then chain `with_*` methods.
///
/// # Defaults
///
/// | Parameter       | Default   |
/// |-----------------|-----------|
/// | `hidden_layers` | `[16, 8]` |
/// | `epochs`        | 20        |
/// | `batch_size`    | 32        |
/// | `learning_rate` | 0.03      |
/// | `seed`          | 42        |
/// | `shuffle`       | `true`    |
#[derive(Debug, Clone)]
pub struct MlpConfig {
    pub(crate) n_inputs: usize,
    pub(crate) hidden_layers: Vec<usize>,
    pub(crate) epochs: usize,
    pub(crate) batch_size: usize,
    pub(crate) learning_rate: f64,
    pub(crate) seed: u64,
    pub(crate) shuffle: bool,
}

impl MlpConfig {
    /// Default hidden layer widths.
    pub const DEFAULT_HIDDEN: [usize; 2] = [16, 8];
    /// Default number of passes over the training set.
    pub const DEFAULT_EPOCHS: usize = 20;
    /// Default mini-batch size.
    pub const DEFAULT_BATCH_SIZE: usize = 32;
    /// Default Adam learning rate.
    pub const DEFAULT_LEARNING_RATE: f64 = 0.03;

    /// Create a new config for inputs of width `n_inputs`.
    ///
    /// # Errors
    ///
    /// Returns [`NnError::InvalidInputWidth`] if `n_inputs` is zero.
    pub fn new(n_inputs: usize) -> Result<Self, NnError> {
        if n_inputs == 0 {
            return Err(NnError::InvalidInputWidth { n_inputs });
        }
        Ok(Self {
            n_inputs,
            hidden_layers: Self::DEFAULT_HIDDEN.to_vec(),
            epochs: Self::DEFAULT_EPOCHS,
            batch_size: Self::DEFAULT_BATCH_SIZE,
            learning_rate: Self::DEFAULT_LEARNING_RATE,
            seed: 42,
            shuffle: true,
        })
    }

    // --- Setters ---

    /// Set the hidden layer widths, input side first.
    #[must_use]
    pub fn with_hidden_layers(mut self, hidden_layers: Vec<usize>) -> Self {
        self.hidden_layers = hidden_layers;
        self
    }

    /// Set the number of passes over the training set.
    #[must_use]
    pub fn with_epochs(mut self, epochs: usize) -> Self {
        self.epochs = epochs;
        self
    }

    /// Set the mini-batch size.
    #[must_use]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Set the Adam learning rate.
    #[must_use]
    pub fn with_learning_rate(mut self, learning_rate: f64) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    /// Set the random seed for weight init and shuffling.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Enable or disable per-epoch shuffling.
    #[must_use]
    pub fn with_shuffle(mut self, shuffle: bool) -> Self {
        self.shuffle = shuffle;
        self
    }

    // --- Getters ---

    /// Return the input width.
    #[must_use]
    pub fn n_inputs(&self) -> usize {
        self.n_inputs
    }

    /// Return the hidden layer widths.
    #[must_use]
    pub fn hidden_layers(&self) -> &[usize] {
        &self.hidden_layers
    }

    /// Return the number of epochs.
    #[must_use]
    pub fn epochs(&self) -> usize {
        self.epochs
    }

    /// Return the mini-batch size.
    #[must_use]
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Return the learning rate.
    #[must_use]
    pub fn learning_rate(&self) -> f64 {
        self.learning_rate
    }

    /// Return the random seed.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Return whether samples are shuffled every epoch.
    #[must_use]
    pub fn shuffle(&self) -> bool {
        self.shuffle
    }

    /// Train on `features` (row-major) against `targets`.
    ///
    /// # Errors
    ///
    /// | Variant                          | When                                     |
    /// |----------------------------------|------------------------------------------|
    /// | [`NnError::InvalidLayerWidth`]   | a hidden layer has zero units            |
    /// | [`NnError::InvalidEpochs`]       | `epochs` is zero                         |
    /// | [`NnError::InvalidBatchSize`]    | `batch_size` is zero                     |
    /// | [`NnError::InvalidLearningRate`] | learning rate is not positive and finite |
    /// | [`NnError::EmptyDataset`]        | `features` is empty                      |
    /// | [`NnError::TargetCountMismatch`] | `features.len() != targets.len()`        |
    /// | [`NnError::FeatureCountMismatch`]| a row's width differs from `n_inputs`    |
    /// | [`NnError::NonFiniteValue`]      | any feature or target is NaN or infinite |
    pub fn fit(&self, features: &[Vec<f64>], targets: &[f64]) -> Result<TrainingResult, NnError> {
        crate::train::train(self, features, targets, |_| {})
    }

    /// Like [`fit`](Self::fit), calling `on_epoch` after every completed pass.
    ///
    /// The callback runs between passes, so a host can yield to other work
    /// there; parameter updates within a pass are never interleaved with it.
    ///
    /// # Errors
    ///
    /// Same as [`fit`](Self::fit).
    pub fn fit_with_progress<F>(
        &self,
        features: &[Vec<f64>],
        targets: &[f64],
        on_epoch: F,
    ) -> Result<TrainingResult, NnError>
    where
        F: FnMut(&EpochReport),
    {
        crate::train::train(self, features, targets, on_epoch)
    }
}
