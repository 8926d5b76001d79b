use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::{info, warn};

use hobli_forecast::{
    FileModelStore, PredictionQuery, Predictor, RainfallService, build_hierarchy, training_set,
};
use hobli_io::{DatasetSpec, ExperimentName, ResultWriter, read_all};
use hobli_nn::{EpochReport, MlpConfig};

#[derive(Parser)]
#[command(name = "hobli")]
#[command(about = "Hobli-level rainfall prediction and crop advisories")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// RNG seed for weight initialization and batch shuffling
    #[arg(long, default_value_t = 42, global = true)]
    seed: u64,

    /// Enable verbose (debug-level) logging
    #[arg(long, global = true)]
    verbose: bool,

    /// Suppress all output except errors
    #[arg(long, global = true)]
    quiet: bool,

    /// Number of threads for parallel computation (defaults to all cores)
    #[arg(long, global = true)]
    threads: Option<usize>,
}

/// Year-labelled input tables.
#[derive(Args, Debug, Clone)]
struct DataArgs {
    /// Rainfall CSV as YEAR=PATH, or PATH named after its year (2021.csv).
    /// Repeat for several years; rows are read in argument order.
    #[arg(long = "data", required = true, num_args = 1..)]
    datasets: Vec<DatasetSpec>,
}

/// Training hyperparameters, used only when no cached model exists.
#[derive(Args, Debug, Clone)]
struct TrainingArgs {
    /// Passes over the training set
    #[arg(long, default_value_t = MlpConfig::DEFAULT_EPOCHS)]
    epochs: usize,

    /// Rows per gradient update
    #[arg(long, default_value_t = MlpConfig::DEFAULT_BATCH_SIZE)]
    batch_size: usize,

    /// Adam learning rate
    #[arg(long, default_value_t = MlpConfig::DEFAULT_LEARNING_RATE)]
    learning_rate: f64,
}

impl TrainingArgs {
    fn config(&self, seed: u64) -> MlpConfig {
        Predictor::default_config(seed)
            .with_epochs(self.epochs)
            .with_batch_size(self.batch_size)
            .with_learning_rate(self.learning_rate)
    }
}

#[derive(Subcommand)]
enum Command {
    /// List districts, the taluks of a district, or the hoblis of a taluk
    Hierarchy {
        #[command(flatten)]
        data: DataArgs,

        /// List the taluks of this district
        #[arg(long)]
        district: Option<String>,

        /// List the hoblis of this taluk (requires --district)
        #[arg(long, requires = "district")]
        taluk: Option<String>,

        /// Also write the full tree to {experiment}_hierarchy.json
        #[arg(long)]
        experiment: Option<String>,

        /// Output directory for result files
        #[arg(long, default_value = ".")]
        output_dir: PathBuf,
    },

    /// Train the rainfall model, or confirm a cached one is usable
    Train {
        #[command(flatten)]
        data: DataArgs,

        /// Model cache file; an existing model is reused, never retrained
        #[arg(long)]
        model: PathBuf,

        #[command(flatten)]
        training: TrainingArgs,
    },

    /// Predict annual and monthly rainfall for a location
    Predict {
        #[command(flatten)]
        data: DataArgs,

        /// Model cache file; trained and saved here if missing
        #[arg(long)]
        model: PathBuf,

        /// District name
        #[arg(long)]
        district: String,

        /// Taluk name inside the district
        #[arg(long)]
        taluk: Option<String>,

        /// Hobli name inside the taluk (requires --taluk)
        #[arg(long, requires = "taluk")]
        hobli: Option<String>,

        /// Target year (defaults to the current year)
        #[arg(long)]
        year: Option<i32>,

        /// Experiment name for output files (must match [a-zA-Z0-9_-]+)
        #[arg(long)]
        experiment: String,

        /// Output directory for result files
        #[arg(long, default_value = ".")]
        output_dir: PathBuf,

        #[command(flatten)]
        training: TrainingArgs,
    },
}

// --- JSON stdout output structs ---

#[derive(Serialize)]
struct HierarchyOutput<'a> {
    n_observations: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    district: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    taluk: Option<&'a str>,
    level: &'static str,
    names: Vec<&'a str>,
}

#[derive(Serialize)]
struct TrainOutput {
    model: PathBuf,
    n_observations: usize,
    n_training_rows: usize,
    ready: bool,
    cached: bool,
    epochs_run: usize,
    final_loss: Option<f64>,
}

#[derive(Serialize)]
struct PredictOutput {
    experiment: String,
    location: String,
    target_year: i32,
    annual_rainfall_mm: i64,
    resolved_key: String,
    output: PathBuf,
}

/// Epoch callback that logs progress and remembers the last loss.
fn epoch_logger(epochs_run: &mut usize, final_loss: &mut Option<f64>) -> impl FnMut(&EpochReport) {
    move |report| {
        *epochs_run += 1;
        *final_loss = Some(report.mean_loss);
        info!(
            epoch = report.epoch,
            epochs = report.epochs,
            mean_loss = report.mean_loss,
            "epoch finished"
        );
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match (cli.verbose, cli.quiet) {
        (true, _) => "debug",
        (_, true) => "error",
        _ => "info",
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Some(threads) = cli.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("failed to configure thread pool")?;
        info!(threads, "thread pool configured");
    }

    match cli.command {
        Command::Hierarchy {
            data,
            district,
            taluk,
            experiment,
            output_dir,
        } => {
            let experiment_name = experiment.map(ExperimentName::new).transpose()?;
            let observations =
                read_all(&data.datasets).context("failed to read rainfall datasets")?;
            let index = build_hierarchy(&observations);
            let service = RainfallService::new(index, None);

            let (level, names) = match (district.as_deref(), taluk.as_deref()) {
                (None, _) => ("district", service.districts()),
                (Some(d), None) => {
                    anyhow::ensure!(
                        service.index().hierarchy.district(d).is_some(),
                        "unknown district: {d}"
                    );
                    ("taluk", service.taluks(d))
                }
                (Some(d), Some(t)) => {
                    anyhow::ensure!(
                        service.index().hierarchy.taluk(d, t).is_some(),
                        "unknown taluk: {t} in district {d}"
                    );
                    ("hobli", service.hoblis(d, t))
                }
            };

            if let Some(name) = experiment_name {
                let writer = ResultWriter::new(&output_dir, name)?;
                writer.write_hierarchy(service.index())?;
            }

            let output = HierarchyOutput {
                n_observations: observations.len(),
                district: district.as_deref(),
                taluk: taluk.as_deref(),
                level,
                names,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }

        Command::Train {
            data,
            model,
            training,
        } => {
            let observations =
                read_all(&data.datasets).context("failed to read rainfall datasets")?;
            let (_, targets) = training_set(&observations);
            let store = FileModelStore::new(&model);
            let config = training.config(cli.seed);

            let mut epochs_run = 0;
            let mut final_loss = None;
            let predictor = Predictor::train_or_load(
                &observations,
                &store,
                &config,
                epoch_logger(&mut epochs_run, &mut final_loss),
            )
            .context("model training failed")?;

            if predictor.is_none() {
                warn!("no row has both normal and actual rainfall; nothing to train on");
            }

            let output = TrainOutput {
                model,
                n_observations: observations.len(),
                n_training_rows: targets.len(),
                ready: predictor.is_some(),
                cached: predictor.is_some() && epochs_run == 0,
                epochs_run,
                final_loss,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }

        Command::Predict {
            data,
            model,
            district,
            taluk,
            hobli,
            year,
            experiment,
            output_dir,
            training,
        } => {
            let experiment_name = ExperimentName::new(experiment.clone())?;

            let observations =
                read_all(&data.datasets).context("failed to read rainfall datasets")?;
            let store = FileModelStore::new(&model);
            let config = training.config(cli.seed);
            let mut epochs_run = 0;
            let mut final_loss = None;
            let service = RainfallService::load(
                &observations,
                &store,
                &config,
                epoch_logger(&mut epochs_run, &mut final_loss),
            )
            .context("failed to prepare rainfall model")?;
            if epochs_run > 0 {
                info!(epochs_run, final_loss, "model trained for this session");
            }

            let mut query = PredictionQuery::district(district);
            if let Some(taluk) = taluk {
                query = query.with_taluk(taluk);
            }
            if let Some(hobli) = hobli {
                query = query.with_hobli(hobli);
            }
            if let Some(year) = year {
                query = query.with_year(year);
            }

            let prediction = service
                .predict(&query)
                .with_context(|| format!("prediction failed for {}", query.label()))?;
            info!(
                location = %prediction.location,
                resolved = %prediction.resolved_key,
                annual_rainfall_mm = prediction.annual_rainfall_mm,
                "prediction ready"
            );

            let writer = ResultWriter::new(&output_dir, experiment_name)?;
            let path = writer.write_prediction(&prediction)?;

            let output = PredictOutput {
                experiment,
                location: prediction.location.clone(),
                target_year: prediction.target_year,
                annual_rainfall_mm: prediction.annual_rainfall_mm,
                resolved_key: prediction.resolved_key.to_string(),
                output: path,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}
