//! EV Fault Core - CLI Entry Point
//!
//! Loads session/log exports, runs the analyzer or the classifier and
//! prints JSON to stdout.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;

use ev_fault_core::api::{self, AnalyzeRequest, ErrorResponse, PredictRequest, TrainRequest};
use ev_fault_core::constants::{APP_NAME, APP_VERSION, DEFAULT_MODEL_NAME};
use ev_fault_core::logic::config::{EngineConfig, TrainingConfig};
use ev_fault_core::logic::records::{
    parse_logs, parse_sessions, ChargingRecord, ChargingSession, RecordFormat,
};
use ev_fault_core::logic::store::open_store;

#[derive(Parser)]
#[command(name = "ev-fault", about = "EV charging fault detection", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the rule-based analyzer over every session.
    Analyze {
        /// Session export (JSON or CSV). Derived from the logs when omitted.
        #[arg(long)]
        sessions: Option<PathBuf>,
        /// Log export (JSON or CSV).
        #[arg(long)]
        logs: PathBuf,
    },
    /// Train a classification model on the logs.
    Train {
        /// Restrict training to the sessions in this export.
        #[arg(long)]
        sessions: Option<PathBuf>,
        #[arg(long)]
        logs: PathBuf,
        #[arg(long)]
        epochs: Option<usize>,
        #[arg(long)]
        batch_size: Option<usize>,
        #[arg(long)]
        validation_split: Option<f32>,
        /// Stop after N epochs without a validation loss improvement.
        #[arg(long)]
        patience: Option<usize>,
        /// Store the trained model under this name.
        #[arg(long)]
        save: Option<String>,
    },
    /// Score logs with a stored model.
    Predict {
        #[arg(long)]
        logs: PathBuf,
        #[arg(long, default_value = DEFAULT_MODEL_NAME)]
        model: String,
    },
    /// List stored models.
    Models,
}

fn read_input(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
}

fn load_logs(path: &Path) -> Result<Vec<ChargingRecord>> {
    let records = parse_logs(&read_input(path)?, RecordFormat::from_path(path))
        .with_context(|| format!("parsing logs from {}", path.display()))?;
    log::info!("Loaded {} log(s) from {}", records.len(), path.display());
    Ok(records)
}

fn load_sessions(path: Option<&Path>) -> Result<Vec<ChargingSession>> {
    let Some(path) = path else {
        return Ok(Vec::new());
    };
    let sessions = parse_sessions(&read_input(path)?, RecordFormat::from_path(path))
        .with_context(|| format!("parsing sessions from {}", path.display()))?;
    log::info!("Loaded {} session(s) from {}", sessions.len(), path.display());
    Ok(sessions)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn run(cli: Cli, config: EngineConfig) -> Result<()> {
    match cli.command {
        Commands::Analyze { sessions, logs } => {
            let request = AnalyzeRequest {
                sessions: load_sessions(sessions.as_deref())?,
                logs: load_logs(&logs)?,
                thresholds: None,
            };
            print_json(&api::analyze_command(request)?)
        }
        Commands::Train {
            sessions,
            logs,
            epochs,
            batch_size,
            validation_split,
            patience,
            save,
        } => {
            let defaults = config.training.clone();
            let request = TrainRequest {
                sessions: load_sessions(sessions.as_deref())?,
                logs: load_logs(&logs)?,
                config: TrainingConfig {
                    epochs: epochs.unwrap_or(defaults.epochs),
                    batch_size: batch_size.unwrap_or(defaults.batch_size),
                    validation_split: validation_split.unwrap_or(defaults.validation_split),
                    early_stopping_patience: patience.or(defaults.early_stopping_patience),
                },
                model_name: save,
                seed: config.seed,
            };
            let store = open_store(&config)?;
            print_json(&api::train_command(request, store.as_ref()).await?)
        }
        Commands::Predict { logs, model } => {
            let request = PredictRequest {
                logs: load_logs(&logs)?,
                model_name: model,
                threshold: None,
            };
            let store = open_store(&config)?;
            print_json(&api::predict_command(request, store.as_ref()).await?)
        }
        Commands::Models => {
            let store = open_store(&config)?;
            print_json(&api::list_models_command(store.as_ref())?)
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    log::info!("Starting {} v{}", APP_NAME, APP_VERSION);

    let result = match EngineConfig::from_env() {
        Ok(config) => run(cli, config).await,
        Err(e) => Err(e.into()),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            match e.downcast_ref::<ErrorResponse>() {
                Some(response) => {
                    if let Ok(json) = serde_json::to_string_pretty(response) {
                        eprintln!("{}", json);
                    }
                }
                None => eprintln!("Error: {:#}", e),
            }
            ExitCode::FAILURE
        }
    }
}
