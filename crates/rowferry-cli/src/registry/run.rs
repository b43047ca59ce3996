use std::fs::{create_dir_all, OpenOptions};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;

use rowferry_core::{ConnectionConfig, MigrationConfig, MigrationReport};

use super::{RegistryError, RegistryResult};

/// Endpoint identity persisted in run artifacts, credentials dropped.
#[derive(Debug, Clone, Serialize)]
pub struct RedactedEndpoint {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub user: String,
    pub schema: String,
}

impl From<&ConnectionConfig> for RedactedEndpoint {
    fn from(endpoint: &ConnectionConfig) -> Self {
        Self {
            host: endpoint.host.clone(),
            port: endpoint.port,
            database: endpoint.database.clone(),
            user: endpoint.user.clone(),
            schema: endpoint.schema.clone(),
        }
    }
}

/// Metadata captured at run start.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    pub run_dir: PathBuf,
}

/// JSON config written to each run directory.
#[derive(Debug, Serialize)]
pub struct RunConfig {
    pub run_id: String,
    pub started_at: String,
    pub source: RedactedEndpoint,
    pub target: RedactedEndpoint,
    pub batch_size: usize,
    pub tables: Vec<String>,
}

/// Paths for run artifacts.
#[derive(Debug, Clone)]
pub struct RunPaths {
    pub config_path: PathBuf,
    pub report_path: PathBuf,
    pub logs_path: PathBuf,
}

/// Create the timestamped run directory and seed it with the redacted run
/// config and an empty event log.
pub fn start_run(ctx: &RunContext, config: &MigrationConfig) -> RegistryResult<RunPaths> {
    let timestamp = ctx.started_at.format("%Y-%m-%dT%H-%M-%SZ").to_string();
    let run_root = ctx.run_dir.join(format!("{timestamp}__run_{}", ctx.run_id));

    create_dir_all(&run_root)?;

    let paths = RunPaths {
        config_path: run_root.join("config.json"),
        report_path: run_root.join("report.json"),
        logs_path: run_root.join("logs.ndjson"),
    };

    let run_config = RunConfig {
        run_id: ctx.run_id.clone(),
        started_at: ctx.started_at.to_rfc3339(),
        source: RedactedEndpoint::from(&config.source),
        target: RedactedEndpoint::from(&config.target),
        batch_size: config.migration.batch_size,
        tables: config.tables.iter().map(|spec| spec.name.clone()).collect(),
    };
    write_json(&paths.config_path, &run_config)?;

    OpenOptions::new()
        .create(true)
        .append(true)
        .open(&paths.logs_path)?;

    Ok(paths)
}

pub fn write_report(paths: &RunPaths, report: &MigrationReport) -> RegistryResult<()> {
    write_json(&paths.report_path, report)
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> RegistryResult<()> {
    let file = OpenOptions::new()
        .create(true)
        .truncate(true)
        .write(true)
        .open(path)?;
    serde_json::to_writer_pretty(file, value).map_err(RegistryError::from)
}
