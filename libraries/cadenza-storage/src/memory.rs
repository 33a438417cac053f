//! In-memory store
//!
//! Volatile `Store` used by tests and by hosts that bring their own
//! persistence. An optional byte quota reproduces the "storage full"
//! failures a browser document store raises on large binary writes.

use crate::error::StorageError;
use async_trait::async_trait;
use cadenza_core::{Result, Store};
use serde_json::Value;
use std::collections::HashMap;
use tokio::sync::RwLock;

#[derive(Debug, Default)]
struct Collection {
    next_seq: u64,
    records: HashMap<String, Record>,
}

#[derive(Debug)]
struct Record {
    seq: u64,
    size: usize,
    value: Value,
}

#[derive(Debug, Default)]
struct Inner {
    collections: HashMap<String, Collection>,
    used_bytes: usize,
}

/// `Store` backed by process memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
    quota_bytes: Option<usize>,
}

impl MemoryStore {
    /// Create an unbounded store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that rejects writes once `quota_bytes` of serialized
    /// records are held
    pub fn with_quota(quota_bytes: usize) -> Self {
        Self {
            inner: RwLock::default(),
            quota_bytes: Some(quota_bytes),
        }
    }

    /// Serialized bytes currently held
    pub async fn used_bytes(&self) -> usize {
        self.inner.read().await.used_bytes
    }

    /// Number of records in a collection
    pub async fn len(&self, collection: &str) -> usize {
        self.inner
            .read()
            .await
            .collections
            .get(collection)
            .map_or(0, |c| c.records.len())
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn put(&self, collection: &str, key: &str, record: Value) -> Result<()> {
        let size = serde_json::to_string(&record)
            .map_err(StorageError::from)?
            .len();

        let mut inner = self.inner.write().await;
        let replaced = inner
            .collections
            .get(collection)
            .and_then(|c| c.records.get(key))
            .map_or(0, |r| r.size);
        let projected = inner.used_bytes - replaced + size;

        if let Some(quota) = self.quota_bytes {
            if projected > quota {
                return Err(StorageError::QuotaExceeded {
                    requested: size,
                    available: quota.saturating_sub(inner.used_bytes - replaced),
                }
                .into());
            }
        }

        inner.used_bytes = projected;
        let entry = inner.collections.entry(collection.to_string()).or_default();
        let seq = match entry.records.get(key) {
            Some(existing) => existing.seq,
            None => {
                entry.next_seq += 1;
                entry.next_seq
            }
        };
        entry.records.insert(
            key.to_string(),
            Record {
                seq,
                size,
                value: record,
            },
        );
        Ok(())
    }

    async fn get(&self, collection: &str, key: &str) -> Result<Option<Value>> {
        let inner = self.inner.read().await;
        Ok(inner
            .collections
            .get(collection)
            .and_then(|c| c.records.get(key))
            .map(|r| r.value.clone()))
    }

    async fn get_all(&self, collection: &str) -> Result<Vec<Value>> {
        let inner = self.inner.read().await;
        let Some(c) = inner.collections.get(collection) else {
            return Ok(Vec::new());
        };

        let mut records: Vec<&Record> = c.records.values().collect();
        records.sort_by_key(|r| r.seq);
        Ok(records.into_iter().map(|r| r.value.clone()).collect())
    }

    async fn delete(&self, collection: &str, key: &str) -> Result<()> {
        let mut inner = self.inner.write().await;
        let removed = inner
            .collections
            .get_mut(collection)
            .and_then(|c| c.records.remove(key));
        if let Some(record) = removed {
            inner.used_bytes -= record.size;
        }
        Ok(())
    }

    async fn clear(&self, collection: &str) -> Result<()> {
        let mut inner = self.inner.write().await;
        if let Some(c) = inner.collections.remove(collection) {
            let freed: usize = c.records.values().map(|r| r.size).sum();
            inner.used_bytes -= freed;
        }
        Ok(())
    }
}
