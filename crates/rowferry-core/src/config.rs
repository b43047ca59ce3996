use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::policy::TableSpec;

/// Default number of rows written per transactional batch.
pub const DEFAULT_BATCH_SIZE: usize = 1000;

/// Connection parameters for one database endpoint.
///
/// The core treats these as opaque beyond attempting to connect; the only
/// shape checks are in [`MigrationConfig::validate`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionConfig {
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub database: String,
    pub user: String,
    pub password: String,
    /// Schema to read from or write into.
    pub schema: String,
}

fn default_port() -> u16 {
    5432
}

/// Transfer behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferSettings {
    /// Rows per transactional batch.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

impl Default for TransferSettings {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}

/// Root configuration for a migration run: two endpoints, transfer settings,
/// and the static, ordered table policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationConfig {
    pub source: ConnectionConfig,
    pub target: ConnectionConfig,
    #[serde(default)]
    pub migration: TransferSettings,
    #[serde(default)]
    pub tables: Vec<TableSpec>,
}

impl MigrationConfig {
    /// Check the few shape invariants the core relies on.
    pub fn validate(&self) -> Result<()> {
        if self.migration.batch_size == 0 {
            return Err(Error::Config("batch_size must be at least 1".to_string()));
        }
        if self.source.schema.is_empty() {
            return Err(Error::Config("source schema must not be empty".to_string()));
        }
        if self.target.schema.is_empty() {
            return Err(Error::Config("target schema must not be empty".to_string()));
        }
        if self.tables.is_empty() {
            return Err(Error::Config(
                "at least one table must be configured".to_string(),
            ));
        }
        Ok(())
    }
}
