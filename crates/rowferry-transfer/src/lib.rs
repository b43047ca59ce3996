//! Data transfer for rowferry: conflict strategy selection, the batch
//! transfer engine, and the migration orchestrator that drives both over the
//! configured table list.

pub mod engine;
pub mod orchestrator;
pub mod strategy;

pub use engine::{TablePlan, TransferEngine, TransferHalted, TransferOutcome};
pub use orchestrator::{AlwaysProceed, AlwaysSkip, Orchestrator, OverwritePolicy};
pub use strategy::{insert_batch_sql, resolve_conflict_action, select_rows_sql, ConflictAction};
