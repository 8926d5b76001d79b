use std::path::PathBuf;

/// Errors from network construction, training, prediction and persistence.
#[derive(Debug, thiserror::Error)]
pub enum NnError {
    /// Returned when the input width is zero.
    #[error("n_inputs must be at least 1, got {n_inputs}")]
    InvalidInputWidth {
        /// The invalid input width provided.
        n_inputs: usize,
    },

    /// Returned when a hidden layer has zero units.
    #[error("hidden layer {layer} must have at least 1 unit")]
    InvalidLayerWidth {
        /// Zero-based index of the offending hidden layer.
        layer: usize,
    },

    /// Returned when epochs is zero.
    #[error("epochs must be at least 1, got {epochs}")]
    InvalidEpochs {
        /// The invalid epochs value provided.
        epochs: usize,
    },

    /// Returned when batch_size is zero.
    #[error("batch_size must be at least 1, got {batch_size}")]
    InvalidBatchSize {
        /// The invalid batch_size value provided.
        batch_size: usize,
    },

    /// Returned when the learning rate is not a positive finite number.
    #[error("learning_rate must be positive and finite, got {learning_rate}")]
    InvalidLearningRate {
        /// The invalid learning rate provided.
        learning_rate: f64,
    },

    /// Returned when the training dataset has zero samples.
    #[error("training dataset has zero samples")]
    EmptyDataset,

    /// Returned when features and targets have different lengths.
    #[error("got {n_features} feature rows but {n_targets} targets")]
    TargetCountMismatch {
        /// Number of feature rows.
        n_features: usize,
        /// Number of targets.
        n_targets: usize,
    },

    /// Returned when a sample has a different number of features than the network input.
    #[error("sample {sample_index} has {got} features, expected {expected}")]
    FeatureCountMismatch {
        /// The expected number of features.
        expected: usize,
        /// The actual number of features in the sample.
        got: usize,
        /// The zero-based index of the offending sample.
        sample_index: usize,
    },

    /// Returned when a prediction input has the wrong width.
    #[error("prediction input has {got} features, expected {expected}")]
    PredictionFeatureMismatch {
        /// The expected number of features.
        expected: usize,
        /// The actual number of features in the prediction input.
        got: usize,
    },

    /// Returned when a training feature or target is NaN or infinite.
    #[error("non-finite value at sample {sample_index}, column {column}")]
    NonFiniteValue {
        /// The zero-based index of the offending sample.
        sample_index: usize,
        /// Feature column index, or `n_inputs` for the target.
        column: usize,
    },

    /// Returned when model serialization fails.
    #[error("failed to serialize model")]
    SerializeModel {
        /// The underlying bincode error.
        source: Box<bincode::ErrorKind>,
    },

    /// Returned when model deserialization fails.
    #[error("failed to deserialize model from {path}")]
    DeserializeModel {
        /// Path to the model file that could not be deserialized.
        path: PathBuf,
        /// The underlying bincode error.
        source: Box<bincode::ErrorKind>,
    },

    /// Returned when writing the model file fails.
    #[error("failed to write model to {path}")]
    WriteModel {
        /// Path to the file that could not be written.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Returned when reading the model file fails.
    #[error("failed to read model from {path}")]
    ReadModel {
        /// Path to the file that could not be read.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Returned when loading a model with an incompatible format version.
    #[error("incompatible model version in {path}: expected {expected}, found {found}")]
    IncompatibleModelVersion {
        /// The model format version this build expects.
        expected: u32,
        /// The model format version found in the file.
        found: u32,
        /// Path to the model file with the incompatible version.
        path: PathBuf,
    },

    /// Returned when a decoded model is not a well-formed network.
    #[error("invalid model in {path}: {reason}")]
    InvalidModel {
        /// Path to the model file.
        path: PathBuf,
        /// Which structural check failed.
        reason: String,
    },
}
