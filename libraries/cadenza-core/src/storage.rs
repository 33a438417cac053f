//! Store trait: the async document store Cadenza persists into

use crate::error::Result;
use async_trait::async_trait;
use serde_json::Value;

/// Async keyed document store over named collections
///
/// Records are JSON documents. There are no cross-collection transactions;
/// callers order their writes so that a failure never leaves a dangling
/// reference they cannot clean up.
///
/// `get_all` returns records in the store's native order, which for the
/// bundled implementations is insertion order (overwrites keep their slot).
#[async_trait]
pub trait Store: Send + Sync {
    /// Insert or replace the record stored under `key`
    async fn put(&self, collection: &str, key: &str, record: Value) -> Result<()>;

    /// Fetch a single record
    async fn get(&self, collection: &str, key: &str) -> Result<Option<Value>>;

    /// Fetch every record in a collection
    async fn get_all(&self, collection: &str) -> Result<Vec<Value>>;

    /// Delete a record; deleting a missing key is not an error
    async fn delete(&self, collection: &str, key: &str) -> Result<()>;

    /// Remove every record in a collection
    async fn clear(&self, collection: &str) -> Result<()>;
}
