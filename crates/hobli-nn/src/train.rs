//! Mini-batch training loop with backpropagation.

use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info, instrument};

use crate::config::MlpConfig;
use crate::error::NnError;
use crate::network::Mlp;
use crate::optimizer::{Adam, LayerBuffers, zeroed_like};
use crate::result::{EpochReport, TrainingMetadata, TrainingResult};

fn validate(config: &MlpConfig, features: &[Vec<f64>], targets: &[f64]) -> Result<(), NnError> {
    if let Some(layer) = config.hidden_layers.iter().position(|&w| w == 0) {
        return Err(NnError::InvalidLayerWidth { layer });
    }
    if config.epochs == 0 {
        return Err(NnError::InvalidEpochs {
            epochs: config.epochs,
        });
    }
    if config.batch_size == 0 {
        return Err(NnError::InvalidBatchSize {
            batch_size: config.batch_size,
        });
    }
    if !(config.learning_rate.is_finite() && config.learning_rate > 0.0) {
        return Err(NnError::InvalidLearningRate {
            learning_rate: config.learning_rate,
        });
    }
    if features.is_empty() {
        return Err(NnError::EmptyDataset);
    }
    if features.len() != targets.len() {
        return Err(NnError::TargetCountMismatch {
            n_features: features.len(),
            n_targets: targets.len(),
        });
    }
    for (sample_index, (row, &target)) in features.iter().zip(targets).enumerate() {
        if row.len() != config.n_inputs {
            return Err(NnError::FeatureCountMismatch {
                expected: config.n_inputs,
                got: row.len(),
                sample_index,
            });
        }
        if let Some(column) = row.iter().position(|v| !v.is_finite()) {
            return Err(NnError::NonFiniteValue {
                sample_index,
                column,
            });
        }
        if !target.is_finite() {
            return Err(NnError::NonFiniteValue {
                sample_index,
                column: config.n_inputs,
            });
        }
    }
    Ok(())
}

/// Activations and pre-activations captured during one forward pass.
struct Trace {
    /// `inputs[l]` is the input to layer `l`; the last entry is the output.
    inputs: Vec<Vec<f64>>,
    /// `pre[l]` is layer `l`'s pre-activation.
    pre: Vec<Vec<f64>>,
}

impl Trace {
    fn new(net: &Mlp) -> Self {
        Self {
            inputs: vec![Vec::new(); net.layers.len() + 1],
            pre: vec![Vec::new(); net.layers.len()],
        }
    }

    fn forward(&mut self, net: &Mlp, sample: &[f64]) -> f64 {
        self.inputs[0].clear();
        self.inputs[0].extend_from_slice(sample);
        for (l, layer) in net.layers.iter().enumerate() {
            let (head, tail) = self.inputs.split_at_mut(l + 1);
            layer.pre_activate(&head[l], &mut self.pre[l]);
            let out = &mut tail[0];
            out.clear();
            out.extend(self.pre[l].iter().map(|&z| layer.activation.apply(z)));
        }
        self.inputs[net.layers.len()][0]
    }
}

/// Accumulate the gradient of `scale * (output - target)^2` into `grads`.
fn backward(net: &Mlp, trace: &Trace, output_grad: f64, grads: &mut [LayerBuffers]) {
    let last = net.layers.len() - 1;
    let mut delta: Vec<f64> = trace.pre[last]
        .iter()
        .map(|&z| output_grad * net.layers[last].activation.derivative(z))
        .collect();

    for l in (0..net.layers.len()).rev() {
        let layer = &net.layers[l];
        let input = &trace.inputs[l];
        let g = &mut grads[l];
        for (o, &d) in delta.iter().enumerate() {
            g.biases[o] += d;
            let row = o * layer.n_inputs;
            for (i, &x) in input.iter().enumerate() {
                g.weights[row + i] += d * x;
            }
        }
        if l == 0 {
            break;
        }
        let below = &net.layers[l - 1];
        delta = (0..layer.n_inputs)
            .map(|i| {
                let back: f64 = delta
                    .iter()
                    .enumerate()
                    .map(|(o, &d)| layer.weights[o * layer.n_inputs + i] * d)
                    .sum();
                back * below.activation.derivative(trace.pre[l - 1][i])
            })
            .collect();
    }
}

/// Train a regressor with mini-batch Adam on mean squared error.
///
/// Passes run strictly in sequence; `on_epoch` is invoked after each one.
#[instrument(skip_all, fields(n_samples = features.len(), epochs = config.epochs))]
pub(crate) fn train<F>(
    config: &MlpConfig,
    features: &[Vec<f64>],
    targets: &[f64],
    mut on_epoch: F,
) -> Result<TrainingResult, NnError>
where
    F: FnMut(&EpochReport),
{
    validate(config, features, targets)?;

    let n_samples = features.len();
    let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
    let mut net = Mlp::initialize(config.n_inputs, &config.hidden_layers, &mut rng);
    let mut adam = Adam::new(&net, config.learning_rate);

    info!(
        n_samples,
        n_inputs = config.n_inputs,
        n_params = net.n_params(),
        batch_size = config.batch_size,
        learning_rate = config.learning_rate,
        "training regressor"
    );

    let mut order: Vec<usize> = (0..n_samples).collect();
    let mut trace = Trace::new(&net);
    let mut loss_history = Vec::with_capacity(config.epochs);
    let mut n_updates = 0usize;

    for epoch in 0..config.epochs {
        if config.shuffle {
            order.shuffle(&mut rng);
        }
        let mut squared_error = 0.0;

        for batch in order.chunks(config.batch_size) {
            let mut grads = zeroed_like(&net);
            let scale = 2.0 / batch.len() as f64;
            for &i in batch {
                let output = trace.forward(&net, &features[i]);
                let err = output - targets[i];
                squared_error += err * err;
                backward(&net, &trace, scale * err, &mut grads);
            }
            adam.apply(&mut net, &grads);
            n_updates += 1;
        }

        let mean_loss = squared_error / n_samples as f64;
        debug!(epoch = epoch + 1, mean_loss, "epoch complete");
        loss_history.push(mean_loss);
        on_epoch(&EpochReport {
            epoch: epoch + 1,
            epochs: config.epochs,
            mean_loss,
        });
    }

    info!(
        final_loss = loss_history.last().copied(),
        n_updates, "regressor training complete"
    );

    let metadata = TrainingMetadata {
        n_samples,
        n_inputs: config.n_inputs,
        epochs: config.epochs,
        batch_size: config.batch_size,
        n_updates,
    };
    Ok(TrainingResult::new(net, loss_history, metadata))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// `y = 2x + 1` on a grid over [0, 1].
    fn linear_data(n: usize) -> (Vec<Vec<f64>>, Vec<f64>) {
        let features: Vec<Vec<f64>> = (0..n).map(|i| vec![i as f64 / n as f64]).collect();
        let targets = features.iter().map(|x| 2.0 * x[0] + 1.0).collect();
        (features, targets)
    }

    #[test]
    fn loss_decreases_on_linear_target() {
        let (features, targets) = linear_data(64);
        let result = MlpConfig::new(1)
            .unwrap()
            .with_epochs(200)
            .with_batch_size(16)
            .with_learning_rate(0.01)
            .fit(&features, &targets)
            .unwrap();
        let history = result.loss_history();
        assert_eq!(history.len(), 200);
        let first = history[0];
        let last = result.final_loss().unwrap();
        assert!(last < first * 0.5, "first = {first}, last = {last}");
    }

    #[test]
    fn update_count_matches_batches() {
        let (features, targets) = linear_data(70);
        let result = MlpConfig::new(1)
            .unwrap()
            .with_epochs(3)
            .with_batch_size(32)
            .fit(&features, &targets)
            .unwrap();
        // 70 samples -> batches of 32, 32, 6
        assert_eq!(result.metadata().n_updates, 9);
        assert_eq!(result.metadata().n_samples, 70);
    }

    #[test]
    fn progress_callback_sees_every_epoch_in_order() {
        let (features, targets) = linear_data(10);
        let mut seen = Vec::new();
        let result = MlpConfig::new(1)
            .unwrap()
            .with_epochs(5)
            .fit_with_progress(&features, &targets, |r| seen.push((r.epoch, r.mean_loss)))
            .unwrap();
        let epochs: Vec<usize> = seen.iter().map(|(e, _)| *e).collect();
        assert_eq!(epochs, vec![1, 2, 3, 4, 5]);
        let losses: Vec<f64> = seen.iter().map(|(_, l)| *l).collect();
        assert_eq!(losses.as_slice(), result.loss_history());
    }

    #[test]
    fn deterministic_with_same_seed() {
        let (features, targets) = linear_data(40);
        let a = MlpConfig::new(1).unwrap().with_seed(9).fit(&features, &targets).unwrap();
        let b = MlpConfig::new(1).unwrap().with_seed(9).fit(&features, &targets).unwrap();
        assert_eq!(a.model(), b.model());
        assert_eq!(a.loss_history(), b.loss_history());
    }

    #[test]
    fn gradient_matches_finite_difference() {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let net = Mlp::initialize(3, &[4, 3], &mut rng);
        let sample = [0.3, -0.7, 1.1];
        let target = 0.25;

        let mut trace = Trace::new(&net);
        let out = trace.forward(&net, &sample);
        let mut grads = zeroed_like(&net);
        backward(&net, &trace, 2.0 * (out - target), &mut grads);

        let loss = |n: &Mlp| {
            let e = n.forward_unchecked(&sample) - target;
            e * e
        };
        let h = 1e-6;
        for (l, layer) in net.layers.iter().enumerate() {
            for w in 0..layer.weights.len() {
                let mut plus = net.clone();
                plus.layers[l].weights[w] += h;
                let mut minus = net.clone();
                minus.layers[l].weights[w] -= h;
                let numeric = (loss(&plus) - loss(&minus)) / (2.0 * h);
                assert!(
                    (numeric - grads[l].weights[w]).abs() < 1e-4,
                    "layer {l} weight {w}: numeric {numeric}, analytic {}",
                    grads[l].weights[w]
                );
            }
        }
    }

    #[test]
    fn empty_dataset_error() {
        let err = MlpConfig::new(2).unwrap().fit(&[], &[]).unwrap_err();
        assert!(matches!(err, NnError::EmptyDataset));
    }

    #[test]
    fn non_finite_target_error() {
        let err = MlpConfig::new(1)
            .unwrap()
            .fit(&[vec![1.0], vec![2.0]], &[1.0, f64::NAN])
            .unwrap_err();
        assert!(matches!(
            err,
            NnError::NonFiniteValue {
                sample_index: 1,
                column: 1
            }
        ));
    }

    #[test]
    fn width_mismatch_error() {
        let err = MlpConfig::new(2)
            .unwrap()
            .fit(&[vec![1.0, 2.0], vec![3.0]], &[1.0, 2.0])
            .unwrap_err();
        assert!(matches!(
            err,
            NnError::FeatureCountMismatch {
                sample_index: 1,
                ..
            }
        ));
    }

    #[test]
    fn invalid_hyperparameters_rejected() {
        let (features, targets) = linear_data(4);
        let base = MlpConfig::new(1).unwrap();
        assert!(matches!(
            base.clone().with_epochs(0).fit(&features, &targets),
            Err(NnError::InvalidEpochs { .. })
        ));
        assert!(matches!(
            base.clone().with_batch_size(0).fit(&features, &targets),
            Err(NnError::InvalidBatchSize { .. })
        ));
        assert!(matches!(
            base.clone().with_learning_rate(-1.0).fit(&features, &targets),
            Err(NnError::InvalidLearningRate { .. })
        ));
        assert!(matches!(
            base.with_hidden_layers(vec![4, 0]).fit(&features, &targets),
            Err(NnError::InvalidLayerWidth { layer: 1 })
        ));
    }
}
