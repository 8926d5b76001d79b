//! Dense feed-forward regression: train, predict, persist.
//!
//! Provides a hand-rolled multi-layer perceptron with ReLU hidden layers
//! and a single linear output, trained by mini-batch Adam on mean squared
//! error, with seeded initialization and bincode model serialization.

mod activation;
mod config;
mod error;
mod layer;
mod network;
mod optimizer;
mod result;
mod serialize;
mod train;

pub use activation::Activation;
pub use config::MlpConfig;
pub use error::NnError;
pub use layer::Dense;
pub use network::Mlp;
pub use result::{EpochReport, TrainingMetadata, TrainingResult};
