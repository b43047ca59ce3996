use sqlx::PgPool;

use rowferry_core::{ColumnInfo, Result};

use crate::catalog::Catalog;

mod queries;

/// Catalog reader for one PostgreSQL schema.
#[derive(Debug, Clone)]
pub struct PostgresCatalog {
    pool: PgPool,
    schema: String,
}

impl PostgresCatalog {
    /// Create a catalog reader over a pre-configured pool.
    pub fn new(pool: PgPool, schema: impl Into<String>) -> Self {
        Self {
            pool,
            schema: schema.into(),
        }
    }

    /// The underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait::async_trait]
impl Catalog for PostgresCatalog {
    fn schema(&self) -> &str {
        &self.schema
    }

    async fn ping(&self) -> Result<()> {
        queries::ping(&self.pool).await
    }

    async fn table_exists(&self, table: &str) -> Result<bool> {
        queries::table_exists(&self.pool, &self.schema, table).await
    }

    async fn table_columns(&self, table: &str) -> Result<Vec<ColumnInfo>> {
        queries::list_columns(&self.pool, &self.schema, table).await
    }

    async fn row_count(&self, table: &str) -> Result<u64> {
        queries::count_rows(&self.pool, &self.schema, table).await
    }

    async fn primary_key(&self, table: &str) -> Result<Option<String>> {
        let columns = queries::primary_key_columns(&self.pool, &self.schema, table).await?;
        match columns.as_slice() {
            [only] => Ok(Some(only.clone())),
            _ => Ok(None),
        }
    }
}
