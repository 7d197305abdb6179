//! Row helpers shared by collectors.
//!
//! Server status and variable values come back typed differently depending on
//! the server flavour and the statement (`SHOW` returns text, `SELECT` from
//! `information_schema` may return integers), so everything is read as text.

use anyhow::{Context, Result};
use sqlx::mysql::{MySqlPool, MySqlRow};
use sqlx::{Column, Row};
use std::collections::BTreeMap;
use tracing::info_span;
use tracing_futures::Instrument as _;

/// Read column `idx` as text. `NULL` and undecodable values yield `None`.
pub fn column_text(row: &MySqlRow, idx: usize) -> Option<String> {
    if let Ok(v) = row.try_get::<Option<String>, _>(idx) {
        return v;
    }
    if let Ok(v) = row.try_get::<Option<i64>, _>(idx) {
        return v.map(|n| n.to_string());
    }
    if let Ok(v) = row.try_get::<Option<u64>, _>(idx) {
        return v.map(|n| n.to_string());
    }
    if let Ok(v) = row.try_get::<Option<f64>, _>(idx) {
        return v.map(|n| n.to_string());
    }
    if let Ok(v) = row.try_get::<Option<Vec<u8>>, _>(idx) {
        return v.map(|bytes| String::from_utf8_lossy(&bytes).into_owned());
    }
    None
}

/// Fold two-column (`Variable_name`, `Value`) rows into a map. Rows with a
/// `NULL` value are dropped.
pub fn name_value_rows(rows: &[MySqlRow]) -> BTreeMap<String, String> {
    rows.iter()
        .filter_map(|row| Some((column_text(row, 0)?, column_text(row, 1)?)))
        .collect()
}

/// Map every non-`NULL` column of `row` by column name.
pub fn row_columns(row: &MySqlRow) -> BTreeMap<String, String> {
    row.columns()
        .iter()
        .filter_map(|col| Some((col.name().to_string(), column_text(row, col.ordinal())?)))
        .collect()
}

/// Run `statement` inside a `db.query` span.
///
/// Uses the text protocol; some `SHOW` statements cannot be prepared.
///
/// # Errors
///
/// Returns an error if the statement fails.
pub async fn query_rows(pool: &MySqlPool, statement: &'static str) -> Result<Vec<MySqlRow>> {
    let operation = statement.split_whitespace().next().unwrap_or_default();
    let span = info_span!(
        "db.query",
        db.system = "mysql",
        db.operation = operation,
        db.statement = statement,
        otel.kind = "client"
    );

    sqlx::raw_sql(statement)
        .fetch_all(pool)
        .instrument(span)
        .await
        .with_context(|| format!("failed to execute {statement}"))
}
