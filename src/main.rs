//! Command-line runner.
//!
//! Reads a JSON array of requests from the file named on the command line, or
//! from stdin when no file is given, processes them as one batch and prints
//! the JSON responses to stdout. Notifications, metrics and the emergency log
//! go to the tracing output on stderr.

use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;

use vitalwatch::batch::process_batch;
use vitalwatch::collaborators::{
    InMemoryHistoryStore, InMemoryMedicationStore, InMemoryProfileStore, TracingChannel,
    TracingEmergencyLog, TracingMetrics,
};
use vitalwatch::config::{self, ConfigError, ServiceConfig};
use vitalwatch::{Collaborators, HealthService, ServiceRequest};

#[derive(Error, Debug)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Failed to read requests from {source_name}: {source}")]
    Input {
        source_name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Requests are not a valid JSON array of requests: {0}")]
    Parse(#[source] serde_json::Error),

    #[error("Failed to write responses: {0}")]
    Output(#[source] serde_json::Error),
}

#[tokio::main]
async fn main() -> ExitCode {
    vitalwatch::init_tracing();
    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    match run(std::env::args_os().nth(1).map(PathBuf::from)).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Run failed");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(input: Option<PathBuf>) -> Result<(), CliError> {
    let config = ServiceConfig::resolve()?;
    config.validate()?;

    let raw = read_input(input)?;
    let requests: Vec<ServiceRequest> = serde_json::from_str(&raw).map_err(CliError::Parse)?;

    let service = Arc::new(HealthService::new(
        Collaborators {
            history: Arc::new(InMemoryHistoryStore::new()),
            medications: Arc::new(InMemoryMedicationStore::new()),
            profiles: Arc::new(InMemoryProfileStore::new()),
            channel: Arc::new(TracingChannel),
            metrics: Arc::new(TracingMetrics),
            emergency_log: Arc::new(TracingEmergencyLog),
        },
        config,
    ));

    let responses = process_batch(service, requests, Utc::now()).await;
    let rendered = serde_json::to_string_pretty(&responses).map_err(CliError::Output)?;
    println!("{rendered}");
    Ok(())
}

fn read_input(input: Option<PathBuf>) -> Result<String, CliError> {
    match input {
        Some(path) => std::fs::read_to_string(&path).map_err(|source| CliError::Input {
            source_name: path.display().to_string(),
            source,
        }),
        None => {
            let mut raw = String::new();
            std::io::stdin()
                .read_to_string(&mut raw)
                .map_err(|source| CliError::Input {
                    source_name: "stdin".into(),
                    source,
                })?;
            Ok(raw)
        }
    }
}
