//! Validated names and dataset arguments.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::IoError;

/// A validated experiment name for output file naming.
///
/// Must match `[a-zA-Z0-9_-]+`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExperimentName(String);

impl ExperimentName {
    /// Parse and validate an experiment name.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::InvalidExperimentName`] if the name is empty or
    /// contains characters outside `[a-zA-Z0-9_-]`.
    pub fn new(name: String) -> Result<Self, IoError> {
        let valid = !name.is_empty()
            && name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(IoError::InvalidExperimentName { name });
        }
        Ok(Self(name))
    }

    /// Return the experiment name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ExperimentName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One year-labelled CSV file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetSpec {
    /// Year every row of the file is recorded under.
    pub year: i32,
    /// CSV path.
    pub path: PathBuf,
}

impl DatasetSpec {
    /// Pair a path with an explicit year.
    pub fn new(year: i32, path: &Path) -> Self {
        Self {
            year,
            path: path.to_path_buf(),
        }
    }
}

impl FromStr for DatasetSpec {
    type Err = IoError;

    /// Accepts `YEAR=PATH`, or a bare `PATH` whose file stem is the year
    /// (`data/2021.csv`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| IoError::InvalidDatasetSpec {
            spec: s.to_string(),
            reason: reason.to_string(),
        };

        if let Some((year, path)) = s.split_once('=') {
            let year = year
                .trim()
                .parse::<i32>()
                .map_err(|_| invalid("text before '=' is not a year"))?;
            if path.is_empty() {
                return Err(invalid("missing path after '='"));
            }
            return Ok(Self::new(year, Path::new(path)));
        }

        let path = Path::new(s);
        let year = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .and_then(|stem| stem.parse::<i32>().ok())
            .ok_or_else(|| invalid("file name is not a year; use YEAR=PATH"))?;
        Ok(Self::new(year, path))
    }
}

impl fmt::Display for DatasetSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.year, self.path.display())
    }
}
