//! Query resolution over a built hierarchy and a trained predictor.

use chrono::Datelike;
use hobli_nn::{EpochReport, MlpConfig};
use rayon::prelude::*;
use tracing::{debug, info, instrument};

use crate::error::ForecastError;
use crate::hierarchy::{LocationIndex, build_hierarchy};
use crate::history::{HistoryEntry, PathKey};
use crate::observation::{Level, Observation};
use crate::predictor::Predictor;
use crate::recommend::{Recommendation, recommendations_for};
use crate::seasonal::{MonthlyRainfall, distribute};
use crate::store::ModelStore;

/// A location selection plus target year.
///
/// `taluk` and `hobli` are optional; a hobli without a taluk is ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PredictionQuery {
    /// District name.
    pub district: String,
    /// Taluk name inside `district`.
    pub taluk: Option<String>,
    /// Hobli name inside `taluk`.
    pub hobli: Option<String>,
    /// Year to predict; the current calendar year when `None`.
    pub target_year: Option<i32>,
}

impl PredictionQuery {
    /// Query for a whole district.
    pub fn district(name: impl Into<String>) -> Self {
        Self {
            district: name.into(),
            taluk: None,
            hobli: None,
            target_year: None,
        }
    }

    /// Narrow to a taluk.
    #[must_use]
    pub fn with_taluk(mut self, name: impl Into<String>) -> Self {
        self.taluk = Some(name.into());
        self
    }

    /// Narrow to a hobli.
    #[must_use]
    pub fn with_hobli(mut self, name: impl Into<String>) -> Self {
        self.hobli = Some(name.into());
        self
    }

    /// Set the target year.
    #[must_use]
    pub fn with_year(mut self, year: i32) -> Self {
        self.target_year = Some(year);
        self
    }

    /// Display label, e.g. `Mysore > Nanjangud > Hullahalli`.
    #[must_use]
    pub fn label(&self) -> String {
        let mut parts = vec![self.district.as_str()];
        if let Some(taluk) = &self.taluk {
            parts.push(taluk);
            if let Some(hobli) = &self.hobli {
                parts.push(hobli);
            }
        }
        parts.join(" > ")
    }

    /// Candidate keys, most specific first.
    fn fallback_chain(&self) -> Vec<PathKey> {
        let mut chain = Vec::with_capacity(3);
        if let Some(taluk) = &self.taluk {
            if let Some(hobli) = &self.hobli {
                chain.push(PathKey::hobli(hobli, &self.district, taluk));
            }
            chain.push(PathKey::taluk(taluk, &self.district));
        }
        chain.push(PathKey::district(&self.district));
        chain
    }
}

/// Result of one prediction.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    /// Label of the requested location.
    pub location: String,
    /// Predicted annual rainfall, rounded to whole mm.
    pub annual_rainfall_mm: i64,
    /// Level whose history fed the model.
    pub resolved_level: Level,
    /// Key whose history fed the model.
    pub resolved_key: PathKey,
    /// Year the prediction is for.
    pub target_year: i32,
    /// Unrounded annual value spread over the months.
    pub monthly: Vec<MonthlyRainfall>,
    /// Advisories for the rounded annual value.
    pub recommendations: &'static [Recommendation],
}

/// Hierarchy, history and model after startup. Immutable once built.
#[derive(Debug, Clone)]
pub struct RainfallService {
    index: LocationIndex,
    predictor: Option<Predictor>,
}

impl RainfallService {
    /// Assemble a service from parts built elsewhere.
    #[must_use]
    pub fn new(index: LocationIndex, predictor: Option<Predictor>) -> Self {
        Self { index, predictor }
    }

    /// Run the startup sequence: build the hierarchy, then load the cached
    /// model from `store` or train one on `observations`.
    ///
    /// A dataset with no usable training row gives a service that lists
    /// locations but answers every prediction with
    /// [`ForecastError::NotReady`].
    ///
    /// # Errors
    ///
    /// Returns [`ForecastError::Model`] if training fails.
    #[instrument(skip_all, fields(n_observations = observations.len()))]
    pub fn load<S, F>(
        observations: &[Observation],
        store: &S,
        config: &MlpConfig,
        on_epoch: F,
    ) -> Result<Self, ForecastError>
    where
        S: ModelStore + ?Sized,
        F: FnMut(&EpochReport),
    {
        let index = build_hierarchy(observations);
        let predictor = Predictor::train_or_load(observations, store, config, on_epoch)?;
        info!(ready = predictor.is_some(), "rainfall service loaded");
        Ok(Self::new(index, predictor))
    }

    /// Return true if a model is available.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.predictor.is_some()
    }

    /// The trained predictor, if any.
    #[must_use]
    pub fn predictor(&self) -> Option<&Predictor> {
        self.predictor.as_ref()
    }

    /// Hierarchy and history.
    #[must_use]
    pub fn index(&self) -> &LocationIndex {
        &self.index
    }

    /// District names in first-seen order.
    #[must_use]
    pub fn districts(&self) -> Vec<&str> {
        self.index
            .hierarchy
            .districts()
            .iter()
            .map(|d| d.name())
            .collect()
    }

    /// Taluk names of `district`; empty if the district is unknown.
    #[must_use]
    pub fn taluks(&self, district: &str) -> Vec<&str> {
        self.index
            .hierarchy
            .district(district)
            .map(|d| d.taluks().iter().map(|t| t.name()).collect())
            .unwrap_or_default()
    }

    /// Hobli names of `district` / `taluk`; empty if either is unknown.
    #[must_use]
    pub fn hoblis(&self, district: &str, taluk: &str) -> Vec<&str> {
        self.index
            .hierarchy
            .taluk(district, taluk)
            .map(|t| t.hoblis().iter().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Most specific key along the query's path that has history.
    #[must_use]
    pub fn resolve(&self, query: &PredictionQuery) -> Option<(PathKey, &[HistoryEntry])> {
        query.fallback_chain().into_iter().find_map(|key| {
            let history = self.index.history.get(&key);
            if history.is_empty() {
                debug!(%key, "no history, falling back");
                None
            } else {
                Some((key, history))
            }
        })
    }

    /// Predict annual and monthly rainfall with advisories for `query`.
    ///
    /// # Errors
    ///
    /// | Variant | When |
    /// |---|---|
    /// | [`ForecastError::NotReady`] | no model was trained or loaded |
    /// | [`ForecastError::NoData`] | no key on the path has usable history |
    /// | [`ForecastError::Model`] | the network rejects the input |
    pub fn predict(&self, query: &PredictionQuery) -> Result<Prediction, ForecastError> {
        let predictor = self.predictor.as_ref().ok_or(ForecastError::NotReady)?;
        let location = query.label();
        let Some((key, history)) = self.resolve(query) else {
            return Err(ForecastError::NoData { location });
        };

        let level = key.level();
        let target_year = query.target_year.unwrap_or_else(current_year);
        let features = match Predictor::node_features(history, level, target_year, &key) {
            Ok(features) => features,
            Err(ForecastError::NoFiniteNormal { .. }) => {
                return Err(ForecastError::NoData { location });
            }
            Err(err) => return Err(err),
        };
        let annual = predictor.predict(&features)?;
        let rounded = annual.round();

        debug!(%location, %key, annual, "prediction");
        Ok(Prediction {
            location,
            annual_rainfall_mm: rounded as i64,
            resolved_level: level,
            resolved_key: key,
            target_year,
            monthly: distribute(annual),
            recommendations: recommendations_for(rounded),
        })
    }

    /// Predict many queries in parallel. Results keep the input order.
    #[must_use]
    pub fn predict_batch(
        &self,
        queries: &[PredictionQuery],
    ) -> Vec<Result<Prediction, ForecastError>> {
        queries.par_iter().map(|q| self.predict(q)).collect()
    }
}

fn current_year() -> i32 {
    chrono::Local::now().year()
}
