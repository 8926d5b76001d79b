//! Training result types.

use crate::network::Mlp;

/// Progress reported after each completed epoch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EpochReport {
    /// One-based epoch number.
    pub epoch: usize,
    /// Total number of epochs in this run.
    pub epochs: usize,
    /// Mean squared error over the epoch's samples, measured during the pass.
    pub mean_loss: f64,
}

/// Metadata about the training run.
#[derive(Debug, Clone)]
pub struct TrainingMetadata {
    /// Number of training samples.
    pub n_samples: usize,
    /// Input width.
    pub n_inputs: usize,
    /// Epochs run.
    pub epochs: usize,
    /// Mini-batch size used.
    pub batch_size: usize,
    /// Optimizer steps taken.
    pub n_updates: usize,
}

/// Result of regressor training: the fitted network and its loss curve.
#[derive(Debug)]
pub struct TrainingResult {
    model: Mlp,
    loss_history: Vec<f64>,
    metadata: TrainingMetadata,
}

impl TrainingResult {
    pub(crate) fn new(model: Mlp, loss_history: Vec<f64>, metadata: TrainingMetadata) -> Self {
        Self {
            model,
            loss_history,
            metadata,
        }
    }

    /// Borrow the fitted network.
    #[must_use]
    pub fn model(&self) -> &Mlp {
        &self.model
    }

    /// Consume the result and return the fitted network.
    #[must_use]
    pub fn into_model(self) -> Mlp {
        self.model
    }

    /// Mean training loss per epoch, in order.
    #[must_use]
    pub fn loss_history(&self) -> &[f64] {
        &self.loss_history
    }

    /// Loss of the last epoch.
    #[must_use]
    pub fn final_loss(&self) -> Option<f64> {
        self.loss_history.last().copied()
    }

    /// Return training metadata.
    #[must_use]
    pub fn metadata(&self) -> &TrainingMetadata {
        &self.metadata
    }
}
