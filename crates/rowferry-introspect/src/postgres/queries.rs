use sqlx::{PgPool, Row};

use rowferry_core::{qualified, ColumnInfo, Error, Result};

fn db_err(err: sqlx::Error) -> Error {
    Error::Catalog(err.to_string())
}

pub async fn ping(pool: &PgPool) -> Result<()> {
    sqlx::query("select 1")
        .execute(pool)
        .await
        .map_err(db_err)?;
    Ok(())
}

pub async fn table_exists(pool: &PgPool, schema: &str, table: &str) -> Result<bool> {
    sqlx::query_scalar::<_, bool>(
        r#"
        select exists (
          select 1
          from pg_class c
          join pg_namespace n on n.oid = c.relnamespace
          where n.nspname = $1
            and c.relname = $2
            and c.relkind in ('r', 'p')
        )
        "#,
    )
    .bind(schema)
    .bind(table)
    .fetch_one(pool)
    .await
    .map_err(db_err)
}

pub async fn list_columns(pool: &PgPool, schema: &str, table: &str) -> Result<Vec<ColumnInfo>> {
    let rows = sqlx::query(
        r#"
        select
          a.attname::text as name,
          pg_catalog.format_type(a.atttypid, a.atttypmod) as data_type
        from pg_attribute a
        join pg_class c on c.oid = a.attrelid
        join pg_namespace n on n.oid = c.relnamespace
        where n.nspname = $1
          and c.relname = $2
          and a.attnum > 0
          and not a.attisdropped
        order by a.attnum
        "#,
    )
    .bind(schema)
    .bind(table)
    .fetch_all(pool)
    .await
    .map_err(db_err)?;

    rows.iter()
        .map(|row| {
            Ok(ColumnInfo {
                name: row.try_get("name").map_err(db_err)?,
                data_type: row.try_get("data_type").map_err(db_err)?,
            })
        })
        .collect()
}

pub async fn primary_key_columns(
    pool: &PgPool,
    schema: &str,
    table: &str,
) -> Result<Vec<String>> {
    let row = sqlx::query(
        r#"
        select array_agg(att.attname::text order by ord.ordinality) as columns
        from pg_constraint con
        join pg_class rel on rel.oid = con.conrelid
        join pg_namespace nsp on nsp.oid = rel.relnamespace
        join unnest(con.conkey) with ordinality as ord(attnum, ordinality) on true
        join pg_attribute att on att.attrelid = rel.oid and att.attnum = ord.attnum
        where nsp.nspname = $1
          and rel.relname = $2
          and con.contype = 'p'
        group by con.conname
        "#,
    )
    .bind(schema)
    .bind(table)
    .fetch_optional(pool)
    .await
    .map_err(db_err)?;

    match row {
        Some(row) => row.try_get("columns").map_err(db_err),
        None => Ok(Vec::new()),
    }
}

pub async fn count_rows(pool: &PgPool, schema: &str, table: &str) -> Result<u64> {
    // Identifiers cannot be bound as parameters; they are quoted into the text.
    let sql = format!("select count(*) from {}", qualified(schema, table));
    let count = sqlx::query_scalar::<_, i64>(&sql)
        .fetch_one(pool)
        .await
        .map_err(db_err)?;
    Ok(count.max(0) as u64)
}
