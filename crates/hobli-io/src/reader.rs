//! CSV reader for year-labelled rainfall tables.

use std::path::{Path, PathBuf};

use hobli_forecast::{Observation, RawRow, normalize};
use serde::Deserialize;
use tracing::{debug, info, instrument, warn};

use crate::IoError;
use crate::domain::DatasetSpec;

/// Column names of the source tables.
pub const LEVEL_COLUMN: &str = "District(D)/Taluk(T)/Hobli(H)";
/// Unit name column.
pub const NAME_COLUMN: &str = "Name";
/// Normal rainfall column.
pub const NORMAL_COLUMN: &str = "Normal (mm)";
/// Actual rainfall column.
pub const ACTUAL_COLUMN: &str = "Actual (mm)";
/// Percent deviation column.
pub const DEVIATION_COLUMN: &str = "%DEP";

/// One CSV row as text. Missing columns read as empty strings.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawRecord {
    #[serde(rename = "District(D)/Taluk(T)/Hobli(H)")]
    level: String,
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "Normal (mm)")]
    normal: String,
    #[serde(rename = "Actual (mm)")]
    actual: String,
    #[serde(rename = "%DEP")]
    deviation: String,
}

impl RawRecord {
    fn as_raw_row(&self) -> RawRow<'_> {
        RawRow {
            level: &self.level,
            name: &self.name,
            normal: &self.normal,
            actual: &self.actual,
            deviation: &self.deviation,
        }
    }
}

/// Reads one year of rainfall rows into [`Observation`]s.
///
/// Expected CSV format: a header row naming at least the columns
/// [`LEVEL_COLUMN`], [`NAME_COLUMN`], [`NORMAL_COLUMN`], [`ACTUAL_COLUMN`]
/// and [`DEVIATION_COLUMN`]. Headers and cells are trimmed; extra columns
/// are ignored and blank lines skipped. Rows without a name or level are
/// dropped; unparseable numbers become NaN. A file where every row is
/// dropped yields no observations and a warning, not an error.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`IoError::FileNotFound`] | File doesn't exist or is unreadable |
/// | [`IoError::CsvParse`] | Malformed CSV record |
pub struct RainfallReader {
    path: PathBuf,
    year: i32,
}

impl RainfallReader {
    /// Create a reader for `path`, labelling every row with `year`.
    pub fn new(path: &Path, year: i32) -> Self {
        Self {
            path: path.to_path_buf(),
            year,
        }
    }

    /// Create a reader from a parsed dataset argument.
    pub fn from_spec(spec: &DatasetSpec) -> Self {
        Self::new(&spec.path, spec.year)
    }

    /// Read and normalize the file, preserving row order.
    #[instrument(skip(self), fields(path = %self.path.display(), year = self.year))]
    pub fn read(&self) -> Result<Vec<Observation>, IoError> {
        let file = std::fs::File::open(&self.path).map_err(|e| IoError::FileNotFound {
            path: self.path.clone(),
            source: e,
        })?;

        // flexible(true) lets short rows through; their missing cells default to "".
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(file);

        let mut observations = Vec::new();
        let mut dropped = 0usize;
        for result in rdr.deserialize::<RawRecord>() {
            let record = result.map_err(|e| IoError::CsvParse {
                path: self.path.clone(),
                offset: e.position().map_or(0, |p| p.byte()),
                source: e,
            })?;
            match normalize(&record.as_raw_row(), self.year) {
                Some(obs) => observations.push(obs),
                None => dropped += 1,
            }
        }
        debug!(dropped, "rows without name or level dropped");

        if observations.is_empty() {
            warn!(dropped, "dataset has no usable rows");
            return Ok(observations);
        }

        info!(n_rows = observations.len(), "dataset loaded");
        Ok(observations)
    }
}

/// Read several datasets and concatenate their rows in argument order.
///
/// Files with no usable rows contribute nothing; the others still load.
///
/// # Errors
///
/// Returns the first error from [`RainfallReader::read`], or
/// [`IoError::EmptyDataset`] when no dataset yields a single row.
#[instrument(skip_all, fields(n_datasets = specs.len()))]
pub fn read_all(specs: &[DatasetSpec]) -> Result<Vec<Observation>, IoError> {
    let mut observations = Vec::new();
    for spec in specs {
        observations.extend(RainfallReader::from_spec(spec).read()?);
    }
    if observations.is_empty() {
        return Err(IoError::EmptyDataset {
            n_datasets: specs.len(),
        });
    }
    info!(n_rows = observations.len(), "all datasets loaded");
    Ok(observations)
}
