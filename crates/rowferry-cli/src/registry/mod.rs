mod logging;
mod run;

pub use logging::init_run_logging;
pub use run::{start_run, write_report, RedactedEndpoint, RunConfig, RunContext, RunPaths};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("logging error: {0}")]
    Logging(String),
}

pub type RegistryResult<T> = std::result::Result<T, RegistryError>;
