//! Dataset loading and result serialization for the hobli pipeline.

mod domain;
mod error;
mod reader;
mod writer;

pub use domain::{DatasetSpec, ExperimentName};
pub use error::IoError;
pub use reader::{
    ACTUAL_COLUMN, DEVIATION_COLUMN, LEVEL_COLUMN, NAME_COLUMN, NORMAL_COLUMN, RainfallReader,
    read_all,
};
pub use writer::ResultWriter;
