use async_trait::async_trait;
use chrono::Utc;
use tracing::{error, info, warn};

use rowferry_core::{
    column_names, reconcile, Error, MigrationReport, Result, SkipReason, TableOutcome,
    TableResult, TableSpec,
};
use rowferry_introspect::Catalog;

use crate::engine::{TablePlan, TransferEngine};
use crate::strategy::resolve_conflict_action;

/// Decides whether a table whose target already contains rows may be written.
///
/// The interactive CLI asks the operator; automated contexts swap in
/// [`AlwaysProceed`] or [`AlwaysSkip`] without changing the core algorithm.
#[async_trait]
pub trait OverwritePolicy: Send + Sync {
    async fn confirm_overwrite(&self, table: &str, existing_rows: u64) -> bool;
}

/// Non-interactive policy that always proceeds.
pub struct AlwaysProceed;

#[async_trait]
impl OverwritePolicy for AlwaysProceed {
    async fn confirm_overwrite(&self, _table: &str, _existing_rows: u64) -> bool {
        true
    }
}

/// Non-interactive policy that always skips.
pub struct AlwaysSkip;

#[async_trait]
impl OverwritePolicy for AlwaysSkip {
    async fn confirm_overwrite(&self, _table: &str, _existing_rows: u64) -> bool {
        false
    }
}

/// Drives introspection, reconciliation, strategy selection, and the batch
/// engine over the configured table list, strictly one table at a time.
pub struct Orchestrator<C> {
    source: C,
    target: C,
    engine: TransferEngine,
    tables: Vec<TableSpec>,
}

impl<C: Catalog> Orchestrator<C> {
    pub fn new(source: C, target: C, engine: TransferEngine, tables: Vec<TableSpec>) -> Self {
        Self {
            source,
            target,
            engine,
            tables,
        }
    }

    /// Run the full migration and finalize its report.
    ///
    /// Catalog failures abort the run; a batch-write failure is recorded on
    /// the affected table and the run proceeds to the next one. The report is
    /// finalized unconditionally once every enumerated table has a terminal
    /// outcome.
    pub async fn run(&self, overwrite: &dyn OverwritePolicy) -> Result<MigrationReport> {
        self.verify_connections().await?;
        info!(event = "connections_verified");

        let tables = self.enumerate_tables().await?;
        info!(event = "tables_enumerated", count = tables.len());

        let mut results = Vec::with_capacity(tables.len());
        for spec in &tables {
            let outcome = self.migrate_table(spec, overwrite).await?;
            results.push(TableResult {
                table: spec.name.clone(),
                outcome,
            });
        }

        let report = MigrationReport::finalize(
            Utc::now().to_rfc3339(),
            self.source.schema().to_string(),
            self.target.schema().to_string(),
            results,
        );
        info!(
            event = "report_finalized",
            tables_success = report.totals.tables_success,
            tables_error = report.totals.tables_error,
            tables_skipped = report.totals.tables_skipped,
            rows_migrated = report.totals.rows_migrated
        );
        Ok(report)
    }

    async fn verify_connections(&self) -> Result<()> {
        self.source
            .ping()
            .await
            .map_err(|err| Error::SourceUnreachable(err.to_string()))?;
        self.target
            .ping()
            .await
            .map_err(|err| Error::TargetUnreachable(err.to_string()))?;
        Ok(())
    }

    /// Tables present in both schemas, in configured order.
    ///
    /// Tables missing on either side are excluded from the run entirely and
    /// surfaced as events, never as report entries.
    async fn enumerate_tables(&self) -> Result<Vec<TableSpec>> {
        let mut enumerated = Vec::with_capacity(self.tables.len());
        for spec in &self.tables {
            let in_source = self.source.table_exists(&spec.name).await?;
            let in_target = self.target.table_exists(&spec.name).await?;
            if in_source && in_target {
                enumerated.push(spec.clone());
                continue;
            }
            if !in_source {
                warn!(event = "table_missing", table = %spec.name, side = "source");
            }
            if !in_target {
                warn!(event = "table_missing", table = %spec.name, side = "target");
            }
        }
        Ok(enumerated)
    }

    async fn migrate_table(
        &self,
        spec: &TableSpec,
        overwrite: &dyn OverwritePolicy,
    ) -> Result<TableOutcome> {
        info!(event = "table_started", table = %spec.name);

        let source_columns = column_names(&self.source.table_columns(&spec.name).await?);
        let target_columns = self.target.table_columns(&spec.name).await?;
        let target_names = column_names(&target_columns);

        let reconciled = reconcile(&source_columns, &target_names, spec.rule.as_ref());
        if reconciled.is_empty() {
            return Ok(self.skip(spec, SkipReason::NoCommonColumns));
        }

        let source_rows = self.source.row_count(&spec.name).await?;
        if source_rows == 0 {
            return Ok(self.skip(spec, SkipReason::SourceEmpty));
        }

        let target_rows = self.target.row_count(&spec.name).await?;
        info!(
            event = "table_counts",
            table = %spec.name,
            source_rows,
            target_rows
        );
        if target_rows > 0 && !overwrite.confirm_overwrite(&spec.name, target_rows).await {
            return Ok(self.skip(spec, SkipReason::OperatorDeclined));
        }

        let primary_key = self.target.primary_key(&spec.name).await?;
        let action = resolve_conflict_action(&reconciled, primary_key.as_deref());

        let mut column_types = Vec::with_capacity(reconciled.len());
        for name in &reconciled {
            match target_columns.iter().find(|column| column.name == *name) {
                Some(column) => column_types.push(column.data_type.clone()),
                None => {
                    return Err(Error::Catalog(format!(
                        "reconciled column {name} missing from target catalog"
                    )));
                }
            }
        }

        let plan = TablePlan {
            table: spec.name.clone(),
            columns: reconciled,
            column_types,
            action,
        };

        match self.engine.copy_table(&plan).await {
            Ok(outcome) => {
                info!(
                    event = "table_finished",
                    table = %spec.name,
                    rows_migrated = outcome.rows_migrated,
                    batches_committed = outcome.batches_committed
                );
                Ok(TableOutcome::Success {
                    rows_migrated: outcome.rows_migrated,
                    columns_migrated: plan.columns.len(),
                })
            }
            Err(halted) => {
                error!(
                    event = "table_failed",
                    table = %spec.name,
                    rows_before_failure = halted.rows_migrated,
                    error = %halted.message
                );
                Ok(TableOutcome::Failed {
                    error: halted.message,
                    rows_migrated: halted.rows_migrated,
                })
            }
        }
    }

    fn skip(&self, spec: &TableSpec, reason: SkipReason) -> TableOutcome {
        info!(event = "table_skipped", table = %spec.name, reason = reason.as_str());
        TableOutcome::skipped(reason)
    }
}
