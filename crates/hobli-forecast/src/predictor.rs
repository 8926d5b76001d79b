//! Train-or-load of the annual rainfall regressor, and node inference.

use hobli_nn::{EpochReport, Mlp, MlpConfig, NnError};
use tracing::{info, instrument, warn};

use crate::error::ForecastError;
use crate::features::{FeatureVector, N_FEATURES};
use crate::history::{HistoryEntry, summarize};
use crate::observation::{Level, Observation};
use crate::store::ModelStore;

/// Training rows: every observation with finite normal and actual rainfall.
///
/// Returns `(features, targets)` with targets = actual rainfall.
#[must_use]
pub fn training_set(observations: &[Observation]) -> (Vec<Vec<f64>>, Vec<f64>) {
    observations
        .iter()
        .filter(|o| o.normal_rainfall.is_finite() && o.actual_rainfall.is_finite())
        .map(|o| {
            let x = FeatureVector::encode(o.normal_rainfall, o.deviation_percent, o.year, o.level);
            (x.to_vec(), o.actual_rainfall)
        })
        .unzip()
}

/// A trained regressor ready for inference.
#[derive(Debug, Clone)]
pub struct Predictor {
    model: Mlp,
}

impl Predictor {
    /// The fixed training configuration: 16 and 8 ReLU units, Adam at 0.03,
    /// 20 epochs in batches of 32.
    #[must_use]
    pub fn default_config(seed: u64) -> MlpConfig {
        MlpConfig::new(N_FEATURES)
            .expect("N_FEATURES is non-zero")
            .with_seed(seed)
    }

    /// Wrap an existing network.
    ///
    /// # Errors
    ///
    /// Returns [`NnError::PredictionFeatureMismatch`] (wrapped) when the
    /// network does not take [`N_FEATURES`] inputs.
    pub fn from_model(model: Mlp) -> Result<Self, ForecastError> {
        if model.n_inputs() != N_FEATURES {
            return Err(NnError::PredictionFeatureMismatch {
                expected: N_FEATURES,
                got: model.n_inputs(),
            }
            .into());
        }
        Ok(Self { model })
    }

    /// Borrow the network.
    #[must_use]
    pub fn model(&self) -> &Mlp {
        &self.model
    }

    /// Train from scratch. `Ok(None)` when no observation is usable.
    ///
    /// # Errors
    ///
    /// Returns [`ForecastError::Model`] if `config` is invalid for training.
    #[instrument(skip_all, fields(n_observations = observations.len()))]
    pub fn train<F>(
        observations: &[Observation],
        config: &MlpConfig,
        on_epoch: F,
    ) -> Result<Option<Self>, ForecastError>
    where
        F: FnMut(&EpochReport),
    {
        let (features, targets) = training_set(observations);
        if features.is_empty() {
            warn!("no observation has both normal and actual rainfall; no model trained");
            return Ok(None);
        }
        info!(n_usable = features.len(), "training rainfall model");
        let result = config.fit_with_progress(&features, &targets, on_epoch)?;
        info!(final_loss = result.final_loss(), "rainfall model trained");
        Ok(Some(Self::from_model(result.into_model())?))
    }

    /// Return the cached model if `store` has one, otherwise train and save.
    ///
    /// A cached model is used as-is and never retrained. A failed save is
    /// logged and the freshly trained model is still returned.
    ///
    /// # Errors
    ///
    /// Returns [`ForecastError::Model`] if training fails.
    #[instrument(skip_all)]
    pub fn train_or_load<S, F>(
        observations: &[Observation],
        store: &S,
        config: &MlpConfig,
        on_epoch: F,
    ) -> Result<Option<Self>, ForecastError>
    where
        S: ModelStore + ?Sized,
        F: FnMut(&EpochReport),
    {
        if let Some(model) = store.load() {
            match Self::from_model(model) {
                Ok(predictor) => {
                    info!(n_params = predictor.model.n_params(), "using cached model");
                    return Ok(Some(predictor));
                }
                Err(err) => warn!(error = %err, "cached model has the wrong shape; retraining"),
            }
        }

        let Some(predictor) = Self::train(observations, config, on_epoch)? else {
            return Ok(None);
        };
        if let Err(err) = store.save(&predictor.model) {
            warn!(error = %err, "failed to persist trained model");
        }
        Ok(Some(predictor))
    }

    /// Model inputs for a node: history means, target year and level flag.
    ///
    /// # Errors
    ///
    /// Returns [`ForecastError::NoFiniteNormal`] when `history` has no
    /// finite normal rainfall value; `key` names the node in the error.
    pub fn node_features(
        history: &[HistoryEntry],
        level: Level,
        year: i32,
        key: &dyn std::fmt::Display,
    ) -> Result<FeatureVector, ForecastError> {
        let summary = summarize(history).ok_or_else(|| ForecastError::NoFiniteNormal {
            key: key.to_string(),
        })?;
        Ok(FeatureVector::encode(
            summary.mean_normal,
            summary.mean_deviation,
            year,
            Some(level),
        ))
    }

    /// Run the network on `features`, clamped to be non-negative.
    ///
    /// # Errors
    ///
    /// Returns [`ForecastError::Model`] if the network rejects the input.
    pub fn predict(&self, features: &FeatureVector) -> Result<f64, ForecastError> {
        let raw = self.model.predict(features.as_slice())?;
        Ok(raw.max(0.0))
    }

    /// Predict annual rainfall for one node from its own history.
    ///
    /// Does not look at ancestors; callers choose which history to pass.
    ///
    /// # Errors
    ///
    /// See [`node_features`](Self::node_features) and [`predict`](Self::predict).
    pub fn predict_node(
        &self,
        history: &[HistoryEntry],
        level: Level,
        year: i32,
    ) -> Result<f64, ForecastError> {
        let features = Self::node_features(history, level, year, &level)?;
        self.predict(&features)
    }
}

#[cfg(test)]
mod tests {
    use crate::store::MemoryModelStore;

    use super::*;

    fn obs(level: Level, normal: f64, actual: f64, deviation: f64, year: i32) -> Observation {
        Observation {
            year,
            level: Some(level),
            name: "X".to_string(),
            normal_rainfall: normal,
            actual_rainfall: actual,
            deviation_percent: deviation,
        }
    }

    fn small_config() -> MlpConfig {
        Predictor::default_config(42).with_epochs(2)
    }

    #[test]
    fn training_set_filters_non_finite_normal_and_actual() {
        let rows = vec![
            obs(Level::District, 800.0, 750.0, -5.0, 2020),
            obs(Level::Taluk, f64::NAN, 700.0, 1.0, 2020),
            obs(Level::Taluk, 820.0, f64::NAN, 1.0, 2020),
            obs(Level::Hobli, 900.0, 950.0, f64::NAN, 2022),
        ];
        let (x, y) = training_set(&rows);
        assert_eq!(y, vec![750.0, 950.0]);
        assert_eq!(x[0], vec![800.0, -5.0, 0.0, 0.0, 0.0, 1.0]);
        // NaN deviation kept the row and encoded as 0.
        assert_eq!(x[1], vec![900.0, 0.0, 0.4, 1.0, 0.0, 0.0]);
    }

    #[test]
    fn no_usable_rows_yields_no_model() {
        let rows = vec![obs(Level::District, f64::NAN, 700.0, 0.0, 2020)];
        let store = MemoryModelStore::new();
        let predictor =
            Predictor::train_or_load(&rows, &store, &small_config(), |_| {}).unwrap();
        assert!(predictor.is_none());
        assert_eq!(store.save_count(), 0);
    }

    #[test]
    fn trains_once_then_reuses_cache() {
        let rows: Vec<Observation> = (0..40)
            .map(|i| obs(Level::Taluk, 500.0 + i as f64, 480.0 + i as f64, -4.0, 2021))
            .collect();
        let store = MemoryModelStore::new();

        let mut epochs = 0;
        let first = Predictor::train_or_load(&rows, &store, &small_config(), |_| epochs += 1)
            .unwrap()
            .unwrap();
        assert_eq!(epochs, 2);
        assert_eq!(store.save_count(), 1);

        let mut retrained = false;
        let second = Predictor::train_or_load(&rows, &store, &small_config(), |_| retrained = true)
            .unwrap()
            .unwrap();
        assert!(!retrained);
        assert_eq!(store.save_count(), 1);
        assert_eq!(first.model(), second.model());
    }

    #[test]
    fn cached_model_with_wrong_width_is_retrained() {
        let wrong = MlpConfig::new(2)
            .unwrap()
            .with_epochs(1)
            .fit(&[vec![0.0, 1.0]], &[1.0])
            .unwrap()
            .into_model();
        let store = MemoryModelStore::with_model(wrong);
        let rows = vec![obs(Level::District, 800.0, 750.0, -5.0, 2020)];
        let predictor = Predictor::train_or_load(&rows, &store, &small_config(), |_| {})
            .unwrap()
            .unwrap();
        assert_eq!(predictor.model().n_inputs(), N_FEATURES);
        assert_eq!(store.save_count(), 1);
    }

    #[test]
    fn node_features_use_history_means() {
        let history = [
            HistoryEntry {
                normal_rainfall: 800.0,
                deviation_percent: -10.0,
                actual_rainfall: 720.0,
            },
            HistoryEntry {
                normal_rainfall: 900.0,
                deviation_percent: f64::NAN,
                actual_rainfall: f64::NAN,
            },
        ];
        let x = Predictor::node_features(&history, Level::Hobli, 2030, &"H|x").unwrap();
        assert_eq!(x.as_slice(), &[850.0, -10.0, 2.0, 1.0, 0.0, 0.0]);
    }

    #[test]
    fn node_without_finite_normal_is_rejected() {
        let history = [HistoryEntry {
            normal_rainfall: f64::NAN,
            deviation_percent: 1.0,
            actual_rainfall: 1.0,
        }];
        let err = Predictor::node_features(&history, Level::Taluk, 2024, &"T|a|b").unwrap_err();
        assert!(matches!(err, ForecastError::NoFiniteNormal { ref key } if key == "T|a|b"));
    }

    #[test]
    fn prediction_is_never_negative() {
        let rows: Vec<Observation> = (0..32)
            .map(|i| obs(Level::District, 100.0 + i as f64, 0.0, -100.0, 2020))
            .collect();
        let predictor = Predictor::train(&rows, &small_config(), |_| {})
            .unwrap()
            .unwrap();
        let x = FeatureVector::encode(-5000.0, -100.0, 2020, Some(Level::District));
        assert!(predictor.predict(&x).unwrap() >= 0.0);
    }
}
