use async_trait::async_trait;

use rowferry_core::{ColumnInfo, Result};

/// Read-only access to catalog metadata for one schema.
///
/// All methods issue read-only queries; any failure is fatal for the run
/// rather than attributable to a single table.
#[async_trait]
pub trait Catalog: Send + Sync {
    /// Name of the schema this catalog reads.
    fn schema(&self) -> &str;

    /// Cheap connectivity probe.
    async fn ping(&self) -> Result<()>;

    /// Whether an ordinary (or partitioned) table with this name exists.
    async fn table_exists(&self, table: &str) -> Result<bool>;

    /// Ordered column list in catalog ordinal order; empty when the table
    /// does not exist.
    async fn table_columns(&self, table: &str) -> Result<Vec<ColumnInfo>>;

    /// Current row count of the table.
    async fn row_count(&self, table: &str) -> Result<u64>;

    /// Single-column primary key name. Composite keys are not specially
    /// handled and report as `None`.
    async fn primary_key(&self, table: &str) -> Result<Option<String>>;
}
