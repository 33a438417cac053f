//! Record table access
//!
//! Every collection lives in a single `records` table keyed by
//! `(collection, key)`. Values are JSON text. Upserts keep the original
//! `rowid`, so `ORDER BY rowid` yields insertion order even after
//! overwrites.
//!
//! # Example
//!
//! ```rust,no_run
//! use cadenza_storage::records;
//! # async fn example(pool: &sqlx::SqlitePool) -> Result<(), Box<dyn std::error::Error>> {
//! records::put_record(pool, "tracks", "t1", &serde_json::json!({"title": "A"})).await?;
//! let track = records::get_record(pool, "tracks", "t1").await?;
//! # Ok(())
//! # }
//! ```

use serde_json::Value;
use sqlx::SqlitePool;
use tracing::warn;

use crate::error::{Result, StorageError};

/// Schema for the record table
pub const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS records (
    collection TEXT NOT NULL,
    key TEXT NOT NULL,
    value TEXT NOT NULL,
    updated_at INTEGER NOT NULL DEFAULT (strftime('%s', 'now')),
    PRIMARY KEY (collection, key)
)";

/// Create the record table if it does not exist yet
///
/// # Errors
///
/// Returns an error if the statement fails
pub async fn ensure_schema(pool: &SqlitePool) -> Result<()> {
    sqlx::query(SCHEMA).execute(pool).await?;
    Ok(())
}

/// Insert or replace a record
///
/// # Arguments
///
/// * `pool` - Database connection pool
/// * `collection` - Collection name
/// * `key` - Record key within the collection
/// * `value` - Record (stored as JSON text)
///
/// # Errors
///
/// Returns an error if serialization or the query fails
pub async fn put_record(pool: &SqlitePool, collection: &str, key: &str, value: &Value) -> Result<()> {
    let value_str = serde_json::to_string(value)?;

    sqlx::query(
        "INSERT INTO records (collection, key, value, updated_at)
         VALUES (?, ?, ?, strftime('%s', 'now'))
         ON CONFLICT(collection, key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
    )
    .bind(collection)
    .bind(key)
    .bind(value_str)
    .execute(pool)
    .await?;

    Ok(())
}

/// Get a single record
///
/// # Returns
///
/// Returns `Ok(Some(value))` if the record exists, `Ok(None)` if not found
///
/// # Errors
///
/// Returns an error if the query fails or the stored JSON is corrupt
pub async fn get_record(pool: &SqlitePool, collection: &str, key: &str) -> Result<Option<Value>> {
    let row: Option<String> =
        sqlx::query_scalar::<_, String>("SELECT value FROM records WHERE collection = ? AND key = ?")
            .bind(collection)
            .bind(key)
            .fetch_optional(pool)
            .await?;

    row.map(|text| parse(&text)).transpose()
}

/// Get every record of a collection in insertion order
///
/// Rows whose stored JSON is corrupt are skipped with a warning so one bad
/// row cannot hide the rest of the collection.
///
/// # Errors
///
/// Returns an error if the query fails
pub async fn get_all_records(pool: &SqlitePool, collection: &str) -> Result<Vec<Value>> {
    let rows: Vec<(String, String)> = sqlx::query_as::<_, (String, String)>(
        "SELECT key, value FROM records WHERE collection = ? ORDER BY rowid",
    )
    .bind(collection)
    .fetch_all(pool)
    .await?;

    let mut values = Vec::with_capacity(rows.len());
    for (key, text) in rows {
        match parse(&text) {
            Ok(value) => values.push(value),
            Err(err) => warn!(collection, key = %key, error = %err, "Skipping corrupt record"),
        }
    }
    Ok(values)
}

/// Delete a record
///
/// # Returns
///
/// Returns `Ok(true)` if a record was deleted, `Ok(false)` if none existed
///
/// # Errors
///
/// Returns an error if the query fails
pub async fn delete_record(pool: &SqlitePool, collection: &str, key: &str) -> Result<bool> {
    let result = sqlx::query("DELETE FROM records WHERE collection = ? AND key = ?")
        .bind(collection)
        .bind(key)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Delete every record of a collection
///
/// # Returns
///
/// Number of records removed
///
/// # Errors
///
/// Returns an error if the query fails
pub async fn clear_collection(pool: &SqlitePool, collection: &str) -> Result<u64> {
    let result = sqlx::query("DELETE FROM records WHERE collection = ?")
        .bind(collection)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}

fn parse(text: &str) -> Result<Value> {
    serde_json::from_str(text).map_err(|e| StorageError::SerializationError(e.to_string()))
}
