//! The store capability traits.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqcache_core::{CacheEntry, CacheKey, Raw};

use crate::StoreError;

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Outcome of a remove operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteStatus {
    /// An entry existed and was removed.
    Deleted,
    /// No entry existed under the key.
    Missing,
}

/// Raw key/value persistence capability.
///
/// Backends deal only in serialized bytes; entry encoding lives in
/// [`EntryStore`]. A `ttl` of `None` leaves the value under the store's own
/// default lifetime policy.
#[async_trait]
pub trait Store: Send + Sync {
    /// Reads the raw value stored under `key`, if any.
    async fn read(&self, key: &CacheKey) -> StoreResult<Option<Raw>>;

    /// Writes a raw value under `key` with an optional time-to-live.
    async fn write(&self, key: &CacheKey, value: Raw, ttl: Option<Duration>) -> StoreResult<()>;

    /// Removes the value stored under `key`.
    async fn remove(&self, key: &CacheKey) -> StoreResult<DeleteStatus>;

    /// Backend name used in diagnostics.
    fn name(&self) -> &str {
        "store"
    }
}

#[async_trait]
impl Store for Box<dyn Store> {
    async fn read(&self, key: &CacheKey) -> StoreResult<Option<Raw>> {
        (**self).read(key).await
    }

    async fn write(&self, key: &CacheKey, value: Raw, ttl: Option<Duration>) -> StoreResult<()> {
        (**self).write(key, value, ttl).await
    }

    async fn remove(&self, key: &CacheKey) -> StoreResult<DeleteStatus> {
        (**self).remove(key).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

#[async_trait]
impl Store for Arc<dyn Store> {
    async fn read(&self, key: &CacheKey) -> StoreResult<Option<Raw>> {
        (**self).read(key).await
    }

    async fn write(&self, key: &CacheKey, value: Raw, ttl: Option<Duration>) -> StoreResult<()> {
        (**self).write(key, value, ttl).await
    }

    async fn remove(&self, key: &CacheKey) -> StoreResult<DeleteStatus> {
        (**self).remove(key).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Typed entry operations layered over any [`Store`].
///
/// Serialization is serde_json; a snapshot that fails to decode surfaces as
/// [`StoreError::Format`], which callers treat like any other cache-origin
/// failure.
#[async_trait]
pub trait EntryStore: Store {
    /// Reads and decodes the entry stored under `key`.
    async fn get(&self, key: &CacheKey) -> StoreResult<Option<CacheEntry>> {
        match self.read(key).await? {
            Some(raw) => Ok(Some(serde_json::from_slice(&raw)?)),
            None => Ok(None),
        }
    }

    /// Encodes and writes `entry` under `key`.
    async fn set(
        &self,
        key: &CacheKey,
        entry: &CacheEntry,
        ttl: Option<Duration>,
    ) -> StoreResult<()> {
        let raw = serde_json::to_vec(entry)?;
        self.write(key, Raw::from(raw), ttl).await
    }

    /// Removes the entry stored under `key`.
    async fn delete(&self, key: &CacheKey) -> StoreResult<DeleteStatus> {
        self.remove(key).await
    }
}

impl<S: Store + ?Sized> EntryStore for S {}
