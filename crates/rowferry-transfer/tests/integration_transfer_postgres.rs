use std::env;

use rowferry_core::TableSpec;
use rowferry_introspect::PostgresCatalog;
use rowferry_transfer::{
    AlwaysProceed, ConflictAction, Orchestrator, TablePlan, TransferEngine,
};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

// The engine streams from one connection while committing on another, so the
// tests hold two single-connection pools against the same database.
async fn connect_pair() -> Option<(PgPool, PgPool)> {
    let Ok(url) = env::var("TEST_DATABASE_URL") else {
        eprintln!("skipping: TEST_DATABASE_URL not set");
        return None;
    };

    let mut pools = Vec::new();
    for _ in 0..2 {
        let pool = PgPoolOptions::new()
            .max_connections(1)
            .acquire_timeout(std::time::Duration::from_secs(10))
            .connect(&url)
            .await
            .expect("connecting to Postgres");
        pools.push(pool);
    }
    let target = pools.pop().expect("target pool");
    let source = pools.pop().expect("source pool");
    Some((source, target))
}

async fn exec_all(pool: &PgPool, statements: &[String]) {
    for sql in statements {
        sqlx::query(sql).execute(pool).await.expect("fixture statement");
    }
}

async fn count(pool: &PgPool, schema: &str, table: &str) -> i64 {
    let sql = format!("select count(*) from {schema}.{table}");
    sqlx::query_scalar::<_, i64>(&sql)
        .fetch_one(pool)
        .await
        .expect("count query")
}

fn names(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}

#[tokio::test]
async fn migrates_tokens_in_exactly_three_batches() {
    let Some((source, target)) = connect_pair().await else { return };
    let (src, tgt) = ("ferry_src_batches", "ferry_tgt_batches");
    exec_all(
        &source,
        &[
            format!("drop schema if exists {src} cascade"),
            format!("drop schema if exists {tgt} cascade"),
            format!("create schema {src}"),
            format!("create schema {tgt}"),
            format!(
                "create table {src}.tokens \
                 (address text primary key, symbol text, decimals integer)"
            ),
            format!(
                "create table {tgt}.tokens \
                 (address text primary key, symbol text, decimals integer)"
            ),
            format!(
                "insert into {src}.tokens \
                 select '0x' || g::text, 'TOK' || g::text, g % 18 \
                 from generate_series(1, 2500) g"
            ),
        ],
    )
    .await;

    let engine = TransferEngine::new(source.clone(), target.clone(), src, tgt, 1000);
    let plan = TablePlan {
        table: "tokens".to_string(),
        columns: names(&["address", "symbol", "decimals"]),
        column_types: names(&["text", "text", "integer"]),
        action: ConflictAction::OverwriteOnKey("address".to_string()),
    };

    let outcome = engine.copy_table(&plan).await.expect("copy");
    assert_eq!(outcome.rows_migrated, 2500);
    assert_eq!(outcome.batches_committed, 3);
    assert_eq!(count(&source, tgt, "tokens").await, 2500);
}

#[tokio::test]
async fn rerun_with_primary_key_refreshes_rows_without_duplicating() {
    let Some((source, target)) = connect_pair().await else { return };
    let (src, tgt) = ("ferry_src_rerun", "ferry_tgt_rerun");
    exec_all(
        &source,
        &[
            format!("drop schema if exists {src} cascade"),
            format!("drop schema if exists {tgt} cascade"),
            format!("create schema {src}"),
            format!("create schema {tgt}"),
            format!("create table {src}.tokens (address text primary key, symbol text)"),
            format!("create table {tgt}.tokens (address text primary key, symbol text)"),
            format!(
                "insert into {src}.tokens \
                 select '0x' || g::text, 'OLD' from generate_series(1, 120) g"
            ),
        ],
    )
    .await;

    let run = |tables: Vec<TableSpec>| {
        let source_catalog = PostgresCatalog::new(source.clone(), src);
        let target_catalog = PostgresCatalog::new(target.clone(), tgt);
        let engine = TransferEngine::new(source.clone(), target.clone(), src, tgt, 50);
        Orchestrator::new(source_catalog, target_catalog, engine, tables)
    };

    let report = run(vec![TableSpec::new("tokens")])
        .run(&AlwaysProceed)
        .await
        .expect("first run");
    assert_eq!(report.totals.rows_migrated, 120);
    assert_eq!(count(&source, tgt, "tokens").await, 120);

    exec_all(&source, &[format!("update {src}.tokens set symbol = 'NEW'")]).await;

    let report = run(vec![TableSpec::new("tokens")])
        .run(&AlwaysProceed)
        .await
        .expect("second run");
    assert_eq!(report.totals.rows_migrated, 120);
    assert_eq!(count(&source, tgt, "tokens").await, 120);

    let refreshed = sqlx::query_scalar::<_, i64>(&format!(
        "select count(*) from {tgt}.tokens where symbol = 'NEW'"
    ))
    .fetch_one(&source)
    .await
    .expect("refresh check");
    assert_eq!(refreshed, 120);
}

#[tokio::test]
async fn unique_constraint_rerun_neither_errors_nor_duplicates() {
    let Some((source, target)) = connect_pair().await else { return };
    let (src, tgt) = ("ferry_src_unique", "ferry_tgt_unique");
    exec_all(
        &source,
        &[
            format!("drop schema if exists {src} cascade"),
            format!("drop schema if exists {tgt} cascade"),
            format!("create schema {src}"),
            format!("create schema {tgt}"),
            format!("create table {src}.graph_weights (token_pair text unique, weight integer)"),
            format!("create table {tgt}.graph_weights (token_pair text unique, weight integer)"),
            format!(
                "insert into {src}.graph_weights \
                 select 'pair-' || g::text, g from generate_series(1, 30) g"
            ),
        ],
    )
    .await;

    let run = || {
        let source_catalog = PostgresCatalog::new(source.clone(), src);
        let target_catalog = PostgresCatalog::new(target.clone(), tgt);
        let engine = TransferEngine::new(source.clone(), target.clone(), src, tgt, 1000);
        Orchestrator::new(
            source_catalog,
            target_catalog,
            engine,
            vec![TableSpec::new("graph_weights")],
        )
    };

    // No primary key, so the engine falls back to insert-skip-duplicates; a
    // second run sends every row again but the unique constraint swallows
    // them all.
    for _ in 0..2 {
        let report = run().run(&AlwaysProceed).await.expect("run");
        assert_eq!(report.totals.tables_success, 1);
        assert_eq!(report.totals.tables_error, 0);
    }
    assert_eq!(count(&source, tgt, "graph_weights").await, 30);
}

#[tokio::test]
async fn mid_stream_failure_preserves_committed_batches() {
    let Some((source, target)) = connect_pair().await else { return };
    let (src, tgt) = ("ferry_src_halt", "ferry_tgt_halt");
    exec_all(
        &source,
        &[
            format!("drop schema if exists {src} cascade"),
            format!("drop schema if exists {tgt} cascade"),
            format!("create schema {src}"),
            format!("create schema {tgt}"),
            format!("create table {src}.executions (id integer, payload text)"),
            format!("create table {tgt}.executions (id integer, payload integer)"),
            // Rows 1..=1000 carry numeric payloads; every later row poisons
            // the cast to the target's integer column.
            format!(
                "insert into {src}.executions \
                 select g, case when g <= 1000 then g::text else 'x' || g::text end \
                 from generate_series(1, 1500) g"
            ),
        ],
    )
    .await;

    let engine = TransferEngine::new(source.clone(), target.clone(), src, tgt, 1000);
    let plan = TablePlan {
        table: "executions".to_string(),
        columns: names(&["id", "payload"]),
        column_types: names(&["integer", "integer"]),
        action: ConflictAction::SkipDuplicates,
    };

    let halted = engine
        .copy_table(&plan)
        .await
        .expect_err("second batch must fail");
    assert_eq!(halted.rows_migrated, 1000);
    assert!(!halted.message.is_empty());
    // Batch one stayed committed; the failing batch rolled back whole.
    assert_eq!(count(&source, tgt, "executions").await, 1000);
}
