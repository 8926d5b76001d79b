//! Rainfall forecasting over the district → taluk → hobli hierarchy.
//!
//! Normalizes tabular rainfall rows, folds them into an administrative tree
//! with per-node history, trains (or loads) a small regressor, and answers
//! location queries with an annual prediction, a monthly split and soil/crop
//! advisories.

mod error;
mod features;
mod hierarchy;
mod history;
mod observation;
mod predictor;
mod recommend;
mod seasonal;
mod service;
mod store;

pub use error::ForecastError;
pub use features::{FeatureVector, N_FEATURES, YEAR_EPOCH, YEAR_SCALE};
pub use hierarchy::{
    District, Hierarchy, HierarchyBuilder, LocationIndex, SkipReason, Taluk, build_hierarchy,
};
pub use history::{History, HistoryEntry, HistorySummary, PathKey, summarize};
pub use observation::{Level, Observation, RawRow, normalize, parse_rainfall};
pub use predictor::{Predictor, training_set};
pub use recommend::{RainfallBand, Recommendation, recommendations_for};
pub use seasonal::{MONSOON_WEIGHTS, MONTHS, MonthlyRainfall, distribute};
pub use service::{Prediction, PredictionQuery, RainfallService};
pub use store::{FileModelStore, MemoryModelStore, ModelStore};
