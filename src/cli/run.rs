use crate::attempt::{Attempt, AttemptBuilder, ComponentLogFiles, DeviceContext, JobQueue};
use crate::config::parse::load_config;
use crate::config::Config;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] crate::config::parse::ConfigError),

    #[error("invalid multiline pattern for component '{component}': {source}")]
    Pattern {
        component: String,
        #[source]
        source: regex::Error,
    },

    #[error("device thing name is not set")]
    MissingThingName,

    #[error("task join error: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("failed to write report: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to serialize report: {0}")]
    Json(#[from] serde_json::Error),
}

/// Attempts from one run, plus what each component still has to read.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    pub attempts: Vec<Attempt>,
    pub pending: BTreeMap<String, JobQueue>,
}

pub async fn run(
    config_path: Option<PathBuf>,
    output: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config_path = match config_path {
        Some(path) => path,
        None => {
            eprintln!("Error: config not found");
            eprintln!("Searched locations:");
            eprintln!("  ~/.config/logship/config.yml");
            eprintln!("  /etc/logship/config.yml");
            eprintln!("\nUse --config <path> to specify a config file, or run 'logship config init' to generate one.");
            std::process::exit(1);
        }
    };

    let report = run_pass(&config_path).await?;
    write_report(&report, output.as_deref())?;
    Ok(())
}

/// Load the config and run one pass per component, each on its own
/// blocking thread.
pub async fn run_pass(config_path: &Path) -> Result<RunReport, RunError> {
    info!(config_path = %config_path.display(), "Loading configuration");
    let config = load_config(config_path)?;
    process_components(&config).await
}

pub async fn process_components(config: &Config) -> Result<RunReport, RunError> {
    let device = DeviceContext {
        thing_name: config
            .device
            .thing_name
            .clone()
            .ok_or(RunError::MissingThingName)?,
        region: config.device.region.clone(),
    };

    if config.components.is_empty() {
        warn!("No components configured, nothing to process");
    }

    let mut handles = Vec::with_capacity(config.components.len());
    for component_config in &config.components {
        let mut component =
            ComponentLogFiles::from_config(component_config).map_err(|source| {
                RunError::Pattern {
                    component: component_config.name.clone(),
                    source,
                }
            })?;
        let builder = AttemptBuilder::new(device.clone());
        info!(
            component = %component.name,
            files = component.queue.len(),
            "Starting pass"
        );
        handles.push(tokio::task::spawn_blocking(move || {
            let attempt = builder.process(&mut component);
            (component, attempt)
        }));
    }

    let mut report = RunReport {
        attempts: Vec::with_capacity(handles.len()),
        pending: BTreeMap::new(),
    };
    for result in futures::future::join_all(handles).await {
        let (component, attempt) = result?;
        report.attempts.push(attempt);
        report.pending.insert(component.name, component.queue);
    }

    Ok(report)
}

fn write_report(report: &RunReport, output: Option<&Path>) -> Result<(), RunError> {
    match output {
        Some(path) => {
            let mut writer = BufWriter::new(File::create(path)?);
            serde_json::to_writer_pretty(&mut writer, report)?;
            writer.flush()?;
            info!(path = %path.display(), "Report written");
        }
        None => {
            let stdout = std::io::stdout();
            let mut writer = stdout.lock();
            serde_json::to_writer_pretty(&mut writer, report)?;
            writeln!(writer)?;
        }
    }
    Ok(())
}
