//! Error types for hobli-forecast.

use hobli_nn::NnError;

/// Errors surfaced to callers of the forecasting pipeline.
///
/// Data-quality problems (unparseable numbers, rows without a name or level,
/// rows out of hierarchy order) never reach this type; they are absorbed
/// while normalizing and folding.
#[derive(Debug, thiserror::Error)]
pub enum ForecastError {
    /// Returned by prediction when no model was trained or loaded.
    #[error("no trained model is available")]
    NotReady,

    /// Returned when no level of the fallback chain has usable history.
    #[error("no rainfall history for {location}")]
    NoData {
        /// Display label of the requested location.
        location: String,
    },

    /// Returned when a node's history has no finite normal rainfall value.
    #[error("history for {key} has no finite normal rainfall")]
    NoFiniteNormal {
        /// Rendered path key of the node.
        key: String,
    },

    /// Wraps a model construction, training or inference error.
    #[error("model error")]
    Model {
        /// The underlying network error.
        #[from]
        source: NnError,
    },
}
