use thiserror::Error;

/// Core error type shared across rowferry crates.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid configuration or migration policy.
    #[error("configuration error: {0}")]
    Config(String),
    /// Catalog query or adapter failure. Fatal for the run.
    #[error("catalog error: {0}")]
    Catalog(String),
    /// The source endpoint could not be reached at startup.
    #[error("source database unreachable: {0}")]
    SourceUnreachable(String),
    /// The target endpoint could not be reached at startup.
    #[error("target database unreachable: {0}")]
    TargetUnreachable(String),
}

/// Convenience alias for results returned by rowferry crates.
pub type Result<T> = std::result::Result<T, Error>;
