use rowferry_core::{qualified, quote_ident};

/// How an insert behaves when a row collides with an existing one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConflictAction {
    /// Insert; on primary-key conflict overwrite all non-key reconciled
    /// columns with the incoming values. Re-running refreshes rows instead of
    /// duplicating or failing.
    OverwriteOnKey(String),
    /// Insert; ignore rows that collide with any existing constraint.
    /// Duplicate-safe but not update-idempotent, and with no unique
    /// constraint at all a re-run will duplicate rows.
    SkipDuplicates,
}

/// Choose the conflict action for a table.
///
/// Upsert-by-key requires the key to be one of the reconciled columns;
/// anything else (no key, composite key collapsed to none, key excluded by an
/// override rule) falls back to duplicate-skip semantics.
pub fn resolve_conflict_action(
    reconciled: &[String],
    primary_key: Option<&str>,
) -> ConflictAction {
    match primary_key {
        Some(key) if reconciled.iter().any(|name| name == key) => {
            ConflictAction::OverwriteOnKey(key.to_string())
        }
        _ => ConflictAction::SkipDuplicates,
    }
}

/// Statement streaming all rows as text, in reconciled column order.
///
/// Values travel through Postgres text I/O; the insert side casts them back
/// to the target column types, so no per-type decoding is needed.
pub fn select_rows_sql(schema: &str, table: &str, columns: &[String]) -> String {
    let list = columns
        .iter()
        .map(|column| format!("{}::text", quote_ident(column)))
        .collect::<Vec<_>>()
        .join(", ");
    format!("select {list} from {}", qualified(schema, table))
}

/// Multi-row insert for one batch, with one `$n::<type>` placeholder per
/// value and the table's conflict clause.
pub fn insert_batch_sql(
    schema: &str,
    table: &str,
    columns: &[String],
    column_types: &[String],
    action: &ConflictAction,
    row_count: usize,
) -> String {
    let list = columns
        .iter()
        .map(|column| quote_ident(column))
        .collect::<Vec<_>>()
        .join(", ");

    let mut param = 0usize;
    let mut tuples = Vec::with_capacity(row_count);
    for _ in 0..row_count {
        let placeholders = column_types
            .iter()
            .map(|data_type| {
                param += 1;
                format!("${param}::{data_type}")
            })
            .collect::<Vec<_>>()
            .join(", ");
        tuples.push(format!("({placeholders})"));
    }

    let mut sql = format!(
        "insert into {} ({list}) values {}",
        qualified(schema, table),
        tuples.join(", ")
    );

    match action {
        ConflictAction::OverwriteOnKey(key) => {
            let updates = columns
                .iter()
                .filter(|column| column.as_str() != key)
                .map(|column| {
                    format!("{} = excluded.{}", quote_ident(column), quote_ident(column))
                })
                .collect::<Vec<_>>()
                .join(", ");
            if updates.is_empty() {
                // The key is the only reconciled column; nothing to overwrite.
                sql.push_str(&format!(" on conflict ({}) do nothing", quote_ident(key)));
            } else {
                sql.push_str(&format!(
                    " on conflict ({}) do update set {updates}",
                    quote_ident(key)
                ));
            }
        }
        ConflictAction::SkipDuplicates => sql.push_str(" on conflict do nothing"),
    }

    sql
}
