//! `Store` implementation over SQLite

use async_trait::async_trait;
use cadenza_core::{Result, Store};
use serde_json::Value;
use sqlx::SqlitePool;

use crate::records;

/// Durable `Store` backed by a `SQLite` pool
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Wrap an existing pool, creating the record table if needed
    ///
    /// # Errors
    ///
    /// Returns an error if the schema cannot be created
    pub async fn new(pool: SqlitePool) -> Result<Self> {
        records::ensure_schema(&pool).await?;
        Ok(Self { pool })
    }

    /// Open (or create) a database and wrap it
    ///
    /// # Arguments
    ///
    /// * `database_url` - `SQLite` connection string (e.g., `sqlite://cadenza.db`)
    ///
    /// # Errors
    ///
    /// Returns an error if the connection or schema creation fails
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = crate::create_pool(database_url).await?;
        Self::new(pool).await
    }

    /// Underlying pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl Store for SqliteStore {
    async fn put(&self, collection: &str, key: &str, record: Value) -> Result<()> {
        records::put_record(&self.pool, collection, key, &record).await?;
        Ok(())
    }

    async fn get(&self, collection: &str, key: &str) -> Result<Option<Value>> {
        Ok(records::get_record(&self.pool, collection, key).await?)
    }

    async fn get_all(&self, collection: &str) -> Result<Vec<Value>> {
        Ok(records::get_all_records(&self.pool, collection).await?)
    }

    async fn delete(&self, collection: &str, key: &str) -> Result<()> {
        records::delete_record(&self.pool, collection, key).await?;
        Ok(())
    }

    async fn clear(&self, collection: &str) -> Result<()> {
        let removed = records::clear_collection(&self.pool, collection).await?;
        tracing::debug!(collection, removed, "Cleared collection");
        Ok(())
    }
}
