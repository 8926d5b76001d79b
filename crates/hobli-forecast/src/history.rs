//! Per-node historical observation log keyed by hierarchy path.

use std::collections::HashMap;
use std::fmt;

use crate::observation::{Level, Observation};

/// Composite key identifying a node by level and ancestor names.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathKey {
    /// `D|name`
    District {
        /// District name.
        name: String,
    },
    /// `T|name|district`
    Taluk {
        /// Taluk name.
        name: String,
        /// Parent district name.
        district: String,
    },
    /// `H|name|district|taluk`
    Hobli {
        /// Hobli name.
        name: String,
        /// Grandparent district name.
        district: String,
        /// Parent taluk name.
        taluk: String,
    },
}

impl PathKey {
    /// Key for a district.
    #[must_use]
    pub fn district(name: &str) -> Self {
        Self::District {
            name: name.to_string(),
        }
    }

    /// Key for a taluk inside `district`.
    #[must_use]
    pub fn taluk(name: &str, district: &str) -> Self {
        Self::Taluk {
            name: name.to_string(),
            district: district.to_string(),
        }
    }

    /// Key for a hobli inside `district` / `taluk`.
    #[must_use]
    pub fn hobli(name: &str, district: &str, taluk: &str) -> Self {
        Self::Hobli {
            name: name.to_string(),
            district: district.to_string(),
            taluk: taluk.to_string(),
        }
    }

    /// The level this key addresses.
    #[must_use]
    pub fn level(&self) -> Level {
        match self {
            Self::District { .. } => Level::District,
            Self::Taluk { .. } => Level::Taluk,
            Self::Hobli { .. } => Level::Hobli,
        }
    }
}

impl fmt::Display for PathKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::District { name } => write!(f, "D|{name}"),
            Self::Taluk { name, district } => write!(f, "T|{name}|{district}"),
            Self::Hobli {
                name,
                district,
                taluk,
            } => write!(f, "H|{name}|{district}|{taluk}"),
        }
    }
}

/// The numeric part of one observation as recorded against a node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HistoryEntry {
    /// Normal rainfall in mm (may be NaN).
    pub normal_rainfall: f64,
    /// Percent deviation (may be NaN).
    pub deviation_percent: f64,
    /// Actual rainfall in mm (may be NaN).
    pub actual_rainfall: f64,
}

impl From<&Observation> for HistoryEntry {
    fn from(obs: &Observation) -> Self {
        Self {
            normal_rainfall: obs.normal_rainfall,
            deviation_percent: obs.deviation_percent,
            actual_rainfall: obs.actual_rainfall,
        }
    }
}

/// Mapping from node path to its observations in row order.
///
/// Only grows while the hierarchy is being folded; read-only afterwards.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct History {
    entries: HashMap<PathKey, Vec<HistoryEntry>>,
}

impl History {
    pub(crate) fn record(&mut self, key: PathKey, entry: HistoryEntry) {
        self.entries.entry(key).or_default().push(entry);
    }

    /// History for `key`; empty when the node was never seen.
    #[must_use]
    pub fn get(&self, key: &PathKey) -> &[HistoryEntry] {
        self.entries.get(key).map_or(&[], Vec::as_slice)
    }

    /// Number of distinct keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Return true if no key has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over all keys and their entries, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (&PathKey, &[HistoryEntry])> {
        self.entries.iter().map(|(k, v)| (k, v.as_slice()))
    }
}

/// Averages of a node's history used as model inputs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HistorySummary {
    /// Mean of the finite normal rainfall values.
    pub mean_normal: f64,
    /// Mean of the finite deviation values, 0 when there are none.
    pub mean_deviation: f64,
    /// Number of entries summarized (finite or not).
    pub n_entries: usize,
}

fn finite_mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values
        .filter(|v| v.is_finite())
        .fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    (count > 0).then(|| sum / count as f64)
}

/// Summarize `entries`, or `None` if no entry has a finite normal value.
#[must_use]
pub fn summarize(entries: &[HistoryEntry]) -> Option<HistorySummary> {
    let mean_normal = finite_mean(entries.iter().map(|e| e.normal_rainfall))?;
    let mean_deviation = finite_mean(entries.iter().map(|e| e.deviation_percent)).unwrap_or(0.0);
    Some(HistorySummary {
        mean_normal,
        mean_deviation,
        n_entries: entries.len(),
    })
}
