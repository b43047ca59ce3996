use futures::TryStreamExt;
use sqlx::{PgPool, Row};
use tracing::debug;

use crate::strategy::{insert_batch_sql, select_rows_sql, ConflictAction};

/// Everything the engine needs to copy one table.
#[derive(Debug, Clone)]
pub struct TablePlan {
    pub table: String,
    /// Reconciled columns, in source catalog order.
    pub columns: Vec<String>,
    /// Target-side type of each reconciled column, positionally aligned.
    pub column_types: Vec<String>,
    pub action: ConflictAction,
}

/// A completed table copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferOutcome {
    pub rows_migrated: u64,
    pub batches_committed: u64,
}

/// A table copy halted mid-stream. Batches committed before the failure stay
/// in the target; later batches were never attempted.
#[derive(Debug, Clone)]
pub struct TransferHalted {
    pub rows_migrated: u64,
    pub message: String,
}

/// Streams rows from the source table and writes them to the target in
/// fixed-size batches, each inside its own transaction, committing strictly
/// in the order the source cursor yields rows.
///
/// Postgres caps bind parameters at `u16::MAX` per statement, so
/// `batch_size * column count` must stay below that.
pub struct TransferEngine {
    source: PgPool,
    target: PgPool,
    source_schema: String,
    target_schema: String,
    batch_size: usize,
}

impl TransferEngine {
    pub fn new(
        source: PgPool,
        target: PgPool,
        source_schema: impl Into<String>,
        target_schema: impl Into<String>,
        batch_size: usize,
    ) -> Self {
        Self {
            source,
            target,
            source_schema: source_schema.into(),
            target_schema: target_schema.into(),
            batch_size,
        }
    }

    pub fn source_schema(&self) -> &str {
        &self.source_schema
    }

    pub fn target_schema(&self) -> &str {
        &self.target_schema
    }

    /// Copy one table according to its plan.
    ///
    /// On failure the open transaction rolls back and the count of rows
    /// committed by earlier batches is preserved in the returned
    /// [`TransferHalted`].
    pub async fn copy_table(&self, plan: &TablePlan) -> Result<TransferOutcome, TransferHalted> {
        let select_sql = select_rows_sql(&self.source_schema, &plan.table, &plan.columns);

        let mut committed_rows: u64 = 0;
        let mut batches_committed: u64 = 0;
        let mut batch: Vec<Vec<Option<String>>> = Vec::with_capacity(self.batch_size);

        let halt = |rows_migrated: u64, err: sqlx::Error| TransferHalted {
            rows_migrated,
            message: err.to_string(),
        };

        let mut rows = sqlx::query(&select_sql).fetch(&self.source);
        while let Some(row) = rows
            .try_next()
            .await
            .map_err(|err| halt(committed_rows, err))?
        {
            let mut values = Vec::with_capacity(plan.columns.len());
            for index in 0..plan.columns.len() {
                let value = row
                    .try_get::<Option<String>, _>(index)
                    .map_err(|err| halt(committed_rows, err))?;
                values.push(value);
            }
            batch.push(values);

            if batch.len() >= self.batch_size {
                self.flush(plan, &batch)
                    .await
                    .map_err(|err| halt(committed_rows, err))?;
                committed_rows += batch.len() as u64;
                batches_committed += 1;
                debug!(
                    event = "batch_committed",
                    table = %plan.table,
                    batch_rows = batch.len(),
                    total_rows = committed_rows
                );
                batch.clear();
            }
        }

        if !batch.is_empty() {
            self.flush(plan, &batch)
                .await
                .map_err(|err| halt(committed_rows, err))?;
            committed_rows += batch.len() as u64;
            batches_committed += 1;
            debug!(
                event = "batch_committed",
                table = %plan.table,
                batch_rows = batch.len(),
                total_rows = committed_rows
            );
        }

        Ok(TransferOutcome {
            rows_migrated: committed_rows,
            batches_committed,
        })
    }

    /// Write one batch as a single multi-row insert inside its own
    /// transaction.
    async fn flush(&self, plan: &TablePlan, batch: &[Vec<Option<String>>]) -> sqlx::Result<()> {
        let sql = insert_batch_sql(
            &self.target_schema,
            &plan.table,
            &plan.columns,
            &plan.column_types,
            &plan.action,
            batch.len(),
        );

        let mut query = sqlx::query(&sql);
        for row in batch {
            for value in row {
                query = query.bind(value.as_deref());
            }
        }

        let mut tx = self.target.begin().await?;
        query.execute(&mut *tx).await?;
        tx.commit().await
    }
}
