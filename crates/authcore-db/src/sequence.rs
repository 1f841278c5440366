//! Monotonic integer IDs backed by the `_sequence` table.

use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;

use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct SequenceRow {
    value: i64,
}

/// Advance the named sequence and return its new value.
///
/// The increment happens in a single `UPSERT` statement, so concurrent
/// callers never observe the same value.
pub async fn next_id<C: Connection>(db: &Surreal<C>, name: &str) -> Result<i64, DbError> {
    let result = db
        .query("UPSERT type::record('_sequence', $name) SET value += 1")
        .bind(("name", name.to_string()))
        .await?;
    let mut result = result
        .check()
        .map_err(|e| DbError::Query(e.to_string()))?;
    let rows: Vec<SequenceRow> = result.take(0)?;
    rows.into_iter()
        .next()
        .map(|row| row.value)
        .ok_or_else(|| DbError::Query(format!("sequence {name} did not advance")))
}
