use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Current contract version for `report.json` artifacts.
pub const REPORT_VERSION: &str = "0.1";

/// Why a table was skipped rather than migrated.
///
/// These are expected, non-error outcomes; the rendered strings are part of
/// the report contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    NoCommonColumns,
    SourceEmpty,
    OperatorDeclined,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkipReason::NoCommonColumns => "no common columns",
            SkipReason::SourceEmpty => "source table empty",
            SkipReason::OperatorDeclined => "user declined overwrite",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal outcome for one table, produced exactly once per table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TableOutcome {
    Success {
        rows_migrated: u64,
        columns_migrated: usize,
    },
    Skipped {
        reason: String,
    },
    #[serde(rename = "error")]
    Failed {
        error: String,
        /// Rows committed in batches prior to the failure.
        rows_migrated: u64,
    },
}

impl TableOutcome {
    pub fn skipped(reason: SkipReason) -> Self {
        TableOutcome::Skipped {
            reason: reason.as_str().to_string(),
        }
    }
}

/// Outcome of one table keyed by its name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct TableResult {
    pub table: String,
    #[serde(flatten)]
    pub outcome: TableOutcome,
}

/// Aggregate counters over a run's table results.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ReportTotals {
    pub tables_success: usize,
    pub tables_error: usize,
    pub tables_skipped: usize,
    /// Rows migrated across successful tables.
    pub rows_migrated: u64,
}

/// The durable artifact of a migration run.
///
/// Field names and nesting are stable across runs so that successive reports
/// can be diffed by tooling; bump [`REPORT_VERSION`] on any shape change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct MigrationReport {
    pub report_version: String,
    /// RFC 3339 run timestamp.
    pub timestamp: String,
    pub source_schema: String,
    pub target_schema: String,
    pub results: Vec<TableResult>,
    pub totals: ReportTotals,
}

impl MigrationReport {
    /// Finalize a report from the ordered per-table results.
    ///
    /// Totals count rows from successful tables only; rows committed before a
    /// table-level failure stay visible on that table's own entry.
    pub fn finalize(
        timestamp: String,
        source_schema: String,
        target_schema: String,
        results: Vec<TableResult>,
    ) -> Self {
        let mut totals = ReportTotals::default();
        for result in &results {
            match &result.outcome {
                TableOutcome::Success { rows_migrated, .. } => {
                    totals.tables_success += 1;
                    totals.rows_migrated += rows_migrated;
                }
                TableOutcome::Skipped { .. } => totals.tables_skipped += 1,
                TableOutcome::Failed { .. } => totals.tables_error += 1,
            }
        }

        Self {
            report_version: REPORT_VERSION.to_string(),
            timestamp,
            source_schema,
            target_schema,
            results,
            totals,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finalize_aggregates_all_three_outcomes() {
        let results = vec![
            TableResult {
                table: "tokens".to_string(),
                outcome: TableOutcome::Success {
                    rows_migrated: 2500,
                    columns_migrated: 6,
                },
            },
            TableResult {
                table: "audit_log".to_string(),
                outcome: TableOutcome::skipped(SkipReason::SourceEmpty),
            },
            TableResult {
                table: "executions".to_string(),
                outcome: TableOutcome::Failed {
                    error: "type mismatch".to_string(),
                    rows_migrated: 1000,
                },
            },
        ];

        let report = MigrationReport::finalize(
            "2026-01-01T00:00:00+00:00".to_string(),
            "arbitrage".to_string(),
            "mig_topology".to_string(),
            results,
        );

        assert_eq!(report.report_version, REPORT_VERSION);
        assert_eq!(report.totals.tables_success, 1);
        assert_eq!(report.totals.tables_error, 1);
        assert_eq!(report.totals.tables_skipped, 1);
        // Partial rows from the failed table are not part of the total.
        assert_eq!(report.totals.rows_migrated, 2500);
    }

    #[test]
    fn skip_reasons_render_report_strings() {
        assert_eq!(SkipReason::NoCommonColumns.as_str(), "no common columns");
        assert_eq!(SkipReason::SourceEmpty.as_str(), "source table empty");
        assert_eq!(
            SkipReason::OperatorDeclined.as_str(),
            "user declined overwrite"
        );
    }

    #[test]
    fn empty_run_still_finalizes() {
        let report = MigrationReport::finalize(
            "2026-01-01T00:00:00+00:00".to_string(),
            "src".to_string(),
            "tgt".to_string(),
            Vec::new(),
        );

        assert_eq!(report.totals, ReportTotals::default());
        assert!(report.results.is_empty());
    }
}
