//! JSON result writer for predictions and hierarchy listings.

use std::fs;
use std::path::{Path, PathBuf};

use hobli_forecast::{Level, LocationIndex, PathKey, Prediction};
use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::IoError;
use crate::domain::ExperimentName;

/// Writes prediction and hierarchy results to JSON files.
///
/// Creates the output directory on construction if it does not exist.
/// Output files are named `{experiment}_prediction.json` and
/// `{experiment}_hierarchy.json`.
pub struct ResultWriter {
    output_dir: PathBuf,
    experiment: ExperimentName,
}

impl ResultWriter {
    /// Create a new writer targeting the given directory and experiment name.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::OutputDirCreate`] if the directory cannot be created.
    #[instrument(skip_all, fields(dir = %output_dir.display(), experiment = %experiment))]
    pub fn new(output_dir: &Path, experiment: ExperimentName) -> Result<Self, IoError> {
        fs::create_dir_all(output_dir).map_err(|e| IoError::OutputDirCreate {
            path: output_dir.to_path_buf(),
            source: e,
        })?;
        debug!("output directory ready");
        Ok(Self {
            output_dir: output_dir.to_path_buf(),
            experiment,
        })
    }

    /// Path of `{experiment}_{suffix}.json` in the output directory.
    #[must_use]
    pub fn artifact_path(&self, suffix: &str) -> PathBuf {
        self.output_dir
            .join(format!("{}_{suffix}.json", self.experiment.as_str()))
    }

    /// Write one prediction to `{experiment}_prediction.json`.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::WriteFile`] if the file cannot be written.
    #[instrument(skip_all)]
    pub fn write_prediction(&self, prediction: &Prediction) -> Result<PathBuf, IoError> {
        let resolved_key = prediction.resolved_key.to_string();
        let artifact = PredictionArtifact {
            experiment: self.experiment.as_str(),
            location: &prediction.location,
            target_year: prediction.target_year,
            annual_rainfall_mm: prediction.annual_rainfall_mm,
            resolved_level: level_name(prediction.resolved_level),
            resolved_key: &resolved_key,
            monthly: prediction
                .monthly
                .iter()
                .map(|m| MonthEntry {
                    month: m.month,
                    rainfall_mm: m.rainfall,
                })
                .collect(),
            recommendations: prediction
                .recommendations
                .iter()
                .map(|r| RecommendationEntry {
                    soil_type: r.soil_type,
                    crops: r.crops,
                    sowing_period: r.sowing_period,
                    common_diseases: r.common_diseases,
                    precautions: r.precautions,
                })
                .collect(),
        };

        let path = self.artifact_path("prediction");
        self.write_json(&path, &artifact)?;
        info!(path = %path.display(), "prediction written");
        Ok(path)
    }

    /// Write the district/taluk/hobli tree with per-node history counts to
    /// `{experiment}_hierarchy.json`.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::WriteFile`] if the file cannot be written.
    #[instrument(skip_all)]
    pub fn write_hierarchy(&self, index: &LocationIndex) -> Result<PathBuf, IoError> {
        let count = |key: PathKey| index.history.get(&key).len();

        let districts: Vec<DistrictEntry> = index
            .hierarchy
            .districts()
            .iter()
            .map(|d| DistrictEntry {
                name: d.name(),
                n_observations: count(PathKey::district(d.name())),
                taluks: d
                    .taluks()
                    .iter()
                    .map(|t| TalukEntry {
                        name: t.name(),
                        n_observations: count(PathKey::taluk(t.name(), d.name())),
                        hoblis: t
                            .hoblis()
                            .iter()
                            .map(|h| HobliEntry {
                                name: h,
                                n_observations: count(PathKey::hobli(h, d.name(), t.name())),
                            })
                            .collect(),
                    })
                    .collect(),
            })
            .collect();

        let artifact = HierarchyArtifact {
            experiment: self.experiment.as_str(),
            n_districts: districts.len(),
            n_nodes: index.history.len(),
            districts,
        };

        let path = self.artifact_path("hierarchy");
        self.write_json(&path, &artifact)?;
        info!(path = %path.display(), "hierarchy written");
        Ok(path)
    }

    fn write_json<T: Serialize>(&self, path: &Path, artifact: &T) -> Result<(), IoError> {
        let json = serde_json::to_string_pretty(artifact).expect("serialization cannot fail");
        fs::write(path, &json).map_err(|e| IoError::WriteFile {
            path: path.to_path_buf(),
            source: e,
        })
    }
}

fn level_name(level: Level) -> &'static str {
    match level {
        Level::District => "district",
        Level::Taluk => "taluk",
        Level::Hobli => "hobli",
    }
}

// --- Shadow structs for JSON serialization ---

#[derive(Serialize)]
struct PredictionArtifact<'a> {
    experiment: &'a str,
    location: &'a str,
    target_year: i32,
    annual_rainfall_mm: i64,
    resolved_level: &'static str,
    resolved_key: &'a str,
    monthly: Vec<MonthEntry>,
    recommendations: Vec<RecommendationEntry>,
}

#[derive(Serialize)]
struct MonthEntry {
    month: &'static str,
    rainfall_mm: f64,
}

#[derive(Serialize)]
struct RecommendationEntry {
    soil_type: &'static str,
    crops: &'static str,
    sowing_period: &'static str,
    common_diseases: &'static str,
    precautions: &'static str,
}

#[derive(Serialize)]
struct HierarchyArtifact<'a> {
    experiment: &'a str,
    n_districts: usize,
    n_nodes: usize,
    districts: Vec<DistrictEntry<'a>>,
}

#[derive(Serialize)]
struct DistrictEntry<'a> {
    name: &'a str,
    n_observations: usize,
    taluks: Vec<TalukEntry<'a>>,
}

#[derive(Serialize)]
struct TalukEntry<'a> {
    name: &'a str,
    n_observations: usize,
    hoblis: Vec<HobliEntry<'a>>,
}

#[derive(Serialize)]
struct HobliEntry<'a> {
    name: &'a str,
    n_observations: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use hobli_forecast::{Observation, build_hierarchy, distribute, recommendations_for};
    use tempfile::TempDir;

    fn obs(level: Level, name: &str) -> Observation {
        Observation {
            year: 2020,
            level: Some(level),
            name: name.to_string(),
            normal_rainfall: 800.0,
            actual_rainfall: 750.0,
            deviation_percent: -5.0,
        }
    }

    fn read_json(path: &Path) -> serde_json::Value {
        serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
    }

    fn sample_prediction() -> Prediction {
        Prediction {
            location: "Mysore > Nanjangud".to_string(),
            annual_rainfall_mm: 812,
            resolved_level: Level::Taluk,
            resolved_key: PathKey::taluk("Nanjangud", "Mysore"),
            target_year: 2024,
            monthly: distribute(812.3),
            recommendations: recommendations_for(812.0),
        }
    }

    #[test]
    fn write_prediction_json_structure() {
        let dir = TempDir::new().unwrap();
        let experiment = ExperimentName::new("run_1".into()).unwrap();
        let writer = ResultWriter::new(dir.path(), experiment).unwrap();

        let path = writer.write_prediction(&sample_prediction()).unwrap();
        assert_eq!(path, dir.path().join("run_1_prediction.json"));

        let content = read_json(&path);
        assert_eq!(content["experiment"], "run_1");
        assert_eq!(content["location"], "Mysore > Nanjangud");
        assert_eq!(content["annual_rainfall_mm"], 812);
        assert_eq!(content["resolved_level"], "taluk");
        assert_eq!(content["resolved_key"], "T|Nanjangud|Mysore");
        assert_eq!(content["target_year"], 2024);

        let monthly = content["monthly"].as_array().unwrap();
        assert_eq!(monthly.len(), 12);
        assert_eq!(monthly[0]["month"], "Jan");
        assert!(monthly[6]["rainfall_mm"].is_number());

        let recs = content["recommendations"].as_array().unwrap();
        assert_eq!(recs.len(), 2);
        assert_eq!(recs[0]["soil_type"], "Red Soil");
        assert_eq!(recs[1]["precautions"], "Integrated pest management");
    }

    #[test]
    fn write_hierarchy_counts_history() {
        let dir = TempDir::new().unwrap();
        let experiment = ExperimentName::new("tree".into()).unwrap();
        let writer = ResultWriter::new(dir.path(), experiment).unwrap();

        let rows = vec![
            obs(Level::District, "Mysore"),
            obs(Level::Taluk, "Nanjangud"),
            obs(Level::Hobli, "Hullahalli"),
            obs(Level::District, "Mysore"),
        ];
        let path = writer.write_hierarchy(&build_hierarchy(&rows)).unwrap();

        let content = read_json(&path);
        assert_eq!(content["n_districts"], 1);
        assert_eq!(content["n_nodes"], 3);
        let mysore = &content["districts"][0];
        assert_eq!(mysore["name"], "Mysore");
        assert_eq!(mysore["n_observations"], 2);
        let taluk = &mysore["taluks"][0];
        assert_eq!(taluk["name"], "Nanjangud");
        assert_eq!(taluk["hoblis"][0]["name"], "Hullahalli");
        assert_eq!(taluk["hoblis"][0]["n_observations"], 1);
    }

    #[test]
    fn creates_nested_output_dir() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("nested").join("deep");
        let experiment = ExperimentName::new("nested".into()).unwrap();
        let writer = ResultWriter::new(&nested, experiment).unwrap();
        writer.write_prediction(&sample_prediction()).unwrap();
        assert!(nested.join("nested_prediction.json").exists());
    }

    #[test]
    fn output_dir_over_a_file_fails() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("file");
        fs::write(&blocker, b"x").unwrap();
        let experiment = ExperimentName::new("x".into()).unwrap();
        let result = ResultWriter::new(&blocker.join("sub"), experiment);
        assert!(matches!(result, Err(IoError::OutputDirCreate { .. })));
    }
}
