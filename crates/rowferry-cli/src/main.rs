mod prompt;
mod registry;

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand, ValueEnum};
use rowferry_core::{
    ConnectionConfig, Error as CoreError, MigrationConfig, MigrationReport, TableOutcome,
};
use rowferry_introspect::{Catalog, PostgresCatalog};
use rowferry_transfer::{
    AlwaysProceed, AlwaysSkip, Orchestrator, OverwritePolicy, TransferEngine,
};
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
enum CliError {
    #[error("registry error: {0}")]
    Registry(#[from] registry::RegistryError),
    #[error("core error: {0}")]
    Core(#[from] CoreError),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

#[derive(Parser, Debug)]
#[command(name = "rowferry", version, about = "Schema-to-schema table data migration")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Migrate the configured tables from source to target.
    Run(RunArgs),
    /// Verify connectivity and list table presence and row counts. Writes
    /// nothing.
    Check(CheckArgs),
}

#[derive(Args, Debug)]
struct RunArgs {
    /// Path to the migration config file.
    #[arg(long, value_name = "PATH", default_value = "rowferry.toml")]
    config: PathBuf,
    /// Output directory for run artifacts.
    #[arg(long, default_value = "runs")]
    run_dir: PathBuf,
    /// Override the configured batch size.
    #[arg(long)]
    batch_size: Option<usize>,
    /// What to do when a target table already contains rows.
    #[arg(long, value_enum, default_value_t = OnExisting::Ask)]
    on_existing: OnExisting,
    /// Skip the whole-run confirmation.
    #[arg(long, default_value_t = false)]
    assume_yes: bool,
}

#[derive(Args, Debug)]
struct CheckArgs {
    /// Path to the migration config file.
    #[arg(long, value_name = "PATH", default_value = "rowferry.toml")]
    config: PathBuf,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum OnExisting {
    /// Prompt for each table.
    Ask,
    /// Skip such tables.
    Skip,
    /// Write without asking.
    Proceed,
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    let cli = Cli::parse();

    match cli.command {
        Command::Run(args) => run_migrate(args).await,
        Command::Check(args) => run_check(args).await,
    }
}

async fn run_migrate(args: RunArgs) -> Result<(), CliError> {
    let mut config = load_config(&args.config)?;
    if let Some(batch_size) = args.batch_size {
        config.migration.batch_size = batch_size;
    }
    config.validate()?;

    let run_id = Uuid::new_v4().to_string();
    let started_at = chrono::Utc::now();
    let run_ctx = registry::RunContext {
        run_id: run_id.clone(),
        started_at,
        run_dir: args.run_dir,
    };
    let run_paths = registry::start_run(&run_ctx, &config)?;
    registry::init_run_logging(&run_paths.logs_path)?;

    tracing::info!(
        event = "run_started",
        run_id = %run_id,
        source_schema = %config.source.schema,
        target_schema = %config.target.schema
    );

    if !args.assume_yes {
        let proceed = prompt::confirm(
            "this operation will modify the target database. continue? [y/N] ".to_string(),
        )
        .await;
        if !proceed {
            tracing::info!(event = "run_cancelled");
            println!("migration cancelled");
            return Ok(());
        }
    }

    // Connections are established lazily; the orchestrator's verification
    // step is the first thing to actually touch either endpoint.
    let source_pool = connect_lazy(&config.source)?;
    let target_pool = connect_lazy(&config.target)?;

    let source_catalog = PostgresCatalog::new(source_pool.clone(), config.source.schema.clone());
    let target_catalog = PostgresCatalog::new(target_pool.clone(), config.target.schema.clone());
    let engine = TransferEngine::new(
        source_pool,
        target_pool,
        config.source.schema.clone(),
        config.target.schema.clone(),
        config.migration.batch_size,
    );
    let orchestrator = Orchestrator::new(source_catalog, target_catalog, engine, config.tables);

    let policy = overwrite_policy(args.on_existing);
    let report = orchestrator.run(policy.as_ref()).await?;

    registry::write_report(&run_paths, &report)?;
    tracing::info!(event = "report_written", path = %run_paths.report_path.display());

    print_summary(&report);
    println!("report written to {}", run_paths.report_path.display());

    Ok(())
}

async fn run_check(args: CheckArgs) -> Result<(), CliError> {
    let config = load_config(&args.config)?;
    config.validate()?;

    let source = PostgresCatalog::new(connect_lazy(&config.source)?, config.source.schema.clone());
    let target = PostgresCatalog::new(connect_lazy(&config.target)?, config.target.schema.clone());

    source
        .ping()
        .await
        .map_err(|err| CoreError::SourceUnreachable(err.to_string()))?;
    target
        .ping()
        .await
        .map_err(|err| CoreError::TargetUnreachable(err.to_string()))?;

    println!(
        "source: {}:{}/{} schema {}",
        config.source.host, config.source.port, config.source.database, config.source.schema
    );
    println!(
        "target: {}:{}/{} schema {}",
        config.target.host, config.target.port, config.target.database, config.target.schema
    );
    println!();

    for spec in &config.tables {
        let source_state = table_state(&source, &spec.name).await?;
        let target_state = table_state(&target, &spec.name).await?;
        println!(
            "  {:<24} source: {:<12} target: {}",
            spec.name, source_state, target_state
        );
    }

    Ok(())
}

async fn table_state(catalog: &PostgresCatalog, table: &str) -> Result<String, CliError> {
    if catalog.table_exists(table).await? {
        let rows = catalog.row_count(table).await?;
        Ok(format!("{rows} rows"))
    } else {
        Ok("missing".to_string())
    }
}

fn overwrite_policy(on_existing: OnExisting) -> Box<dyn OverwritePolicy> {
    match on_existing {
        OnExisting::Ask => Box::new(prompt::StdinPrompt),
        OnExisting::Skip => Box::new(AlwaysSkip),
        OnExisting::Proceed => Box::new(AlwaysProceed),
    }
}

fn load_config(path: &Path) -> Result<MigrationConfig, CliError> {
    let content = std::fs::read_to_string(path)
        .map_err(|err| CliError::InvalidConfig(format!("reading {}: {err}", path.display())))?;
    toml::from_str(&content)
        .map_err(|err| CliError::InvalidConfig(format!("parsing {}: {err}", path.display())))
}

fn connect_lazy(endpoint: &ConnectionConfig) -> Result<PgPool, CliError> {
    let options = PgConnectOptions::new()
        .host(&endpoint.host)
        .port(endpoint.port)
        .database(&endpoint.database)
        .username(&endpoint.user)
        .password(&endpoint.password);

    // One connection per endpoint for the whole run.
    let pool = PgPoolOptions::new()
        .max_connections(1)
        .acquire_timeout(std::time::Duration::from_secs(10))
        .connect_lazy_with(options);
    Ok(pool)
}

fn print_summary(report: &MigrationReport) {
    println!();
    println!("migration summary");
    for result in &report.results {
        match &result.outcome {
            TableOutcome::Success {
                rows_migrated,
                columns_migrated,
            } => println!(
                "  {}: success ({rows_migrated} rows, {columns_migrated} columns)",
                result.table
            ),
            TableOutcome::Skipped { reason } => {
                println!("  {}: skipped ({reason})", result.table)
            }
            TableOutcome::Failed {
                error,
                rows_migrated,
            } => println!(
                "  {}: error after {rows_migrated} rows ({error})",
                result.table
            ),
        }
    }
    let totals = &report.totals;
    println!(
        "totals: {} succeeded, {} failed, {} skipped, {} rows migrated",
        totals.tables_success, totals.tables_error, totals.tables_skipped, totals.rows_migrated
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
[source]
host = "localhost"
port = 5433
database = "arbitrage_bot"
user = "arbitrage_user"
password = "arbitrage_pass"
schema = "arbitrage"

[target]
host = "localhost"
database = "mig_topology"
user = "mig_topology_user"
password = "mig_topology_pass"
schema = "mig_topology"

[migration]
batch_size = 500

[[tables]]
name = "tokens"

[[tables]]
name = "pool_statistics"
rule = { exclude = ["avg_profit_usd"], include = ["pool_address", "tvl_usd", "updated_at"] }
"#;

    #[test]
    fn parses_full_config_document() {
        let config: MigrationConfig = toml::from_str(SAMPLE).expect("parse config");

        assert_eq!(config.source.port, 5433);
        // Port falls back to the Postgres default when omitted.
        assert_eq!(config.target.port, 5432);
        assert_eq!(config.migration.batch_size, 500);
        assert_eq!(config.tables.len(), 2);

        assert!(config.tables[0].rule.is_none());
        let rule = config.tables[1].rule.as_ref().expect("override rule");
        assert_eq!(rule.exclude, vec!["avg_profit_usd".to_string()]);
        assert_eq!(
            rule.include.as_deref(),
            Some(
                &[
                    "pool_address".to_string(),
                    "tvl_usd".to_string(),
                    "updated_at".to_string()
                ][..]
            )
        );

        config.validate().expect("valid config");
    }

    #[test]
    fn batch_size_defaults_when_migration_section_is_absent() {
        let trimmed = SAMPLE.replace("[migration]\nbatch_size = 500\n", "");
        let config: MigrationConfig = toml::from_str(&trimmed).expect("parse config");
        assert_eq!(config.migration.batch_size, 1000);
    }
}
