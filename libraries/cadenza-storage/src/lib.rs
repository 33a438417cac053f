//! Cadenza Storage
//!
//! `Store` implementations for the Cadenza playback engine.
//!
//! # Architecture
//!
//! - **`MemoryStore`**: volatile, insertion-ordered maps with an optional
//!   byte quota (tests, hosts with their own persistence)
//! - **`SqliteStore`**: durable single-table document store over `sqlx`
//! - **`records`**: the free functions `SqliteStore` is built from
//!
//! # Example
//!
//! ```rust,no_run
//! use cadenza_storage::SqliteStore;
//! use cadenza_core::Store;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = SqliteStore::connect("sqlite://cadenza.db").await?;
//! let tracks = store.get_all("tracks").await?;
//! # Ok(())
//! # }
//! ```

mod error;
mod memory;
mod sqlite;

pub mod records;

pub use error::StorageError;
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use sqlx::sqlite::SqlitePool;

/// Create a new `SQLite` pool
///
/// # Arguments
///
/// * `database_url` - `SQLite` connection string (e.g., `<sqlite://cadenza.db>`)
///
/// # Errors
///
/// Returns an error if the connection fails
pub async fn create_pool(database_url: &str) -> Result<SqlitePool, StorageError> {
    use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
    use std::str::FromStr;

    tracing::debug!(database_url, "Creating SQLite pool");

    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(std::time::Duration::from_secs(30));

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

    tracing::info!(database_url, "SQLite pool ready");

    Ok(pool)
}
