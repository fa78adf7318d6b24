//! In-memory store adapter.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use reqcache_core::{CacheKey, Raw};
use tracing::trace;

use crate::store::{DeleteStatus, Store, StoreResult};
use crate::StoreError;

#[derive(Debug, Clone)]
struct StoredValue {
    raw: Raw,
    expires_at: Option<DateTime<Utc>>,
}

/// In-memory cache store backed by a concurrent hash map.
///
/// Values carry their own expiry timestamp; expired values are evicted
/// lazily on read. A store-level default TTL can be configured for writes
/// that do not specify one.
///
/// # Caveats
///
/// - Data is not persisted across process restarts.
/// - Data is not shared across processes.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use reqcache_store::MemoryStore;
///
/// let unbounded = MemoryStore::new();
/// let bounded = MemoryStore::with_default_ttl(Duration::from_secs(300));
/// # let _ = (unbounded, bounded);
/// ```
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: DashMap<CacheKey, StoredValue>,
    default_ttl: Option<Duration>,
}

impl MemoryStore {
    /// Creates a store whose values never expire unless a TTL is given at
    /// write time.
    pub fn new() -> Self {
        MemoryStore::default()
    }

    /// Creates a store applying `ttl` to writes that carry none.
    pub fn with_default_ttl(ttl: Duration) -> Self {
        MemoryStore {
            entries: DashMap::new(),
            default_ttl: Some(ttl),
        }
    }

    /// Number of values currently held, expired or not.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the store holds no values.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn read(&self, key: &CacheKey) -> StoreResult<Option<Raw>> {
        let expired = match self.entries.get(key) {
            Some(value) => match value.expires_at {
                Some(at) if at <= Utc::now() => true,
                _ => return Ok(Some(value.raw.clone())),
            },
            None => return Ok(None),
        };
        // remove must not run while a read guard is held
        if expired {
            trace!(key = %key, "evicting expired value");
            self.entries.remove(key);
        }
        Ok(None)
    }

    async fn write(&self, key: &CacheKey, value: Raw, ttl: Option<Duration>) -> StoreResult<()> {
        let expires_at = match ttl.or(self.default_ttl) {
            Some(ttl) => Some(
                Utc::now()
                    + chrono::Duration::from_std(ttl)
                        .map_err(|e| StoreError::Internal(Box::new(e)))?,
            ),
            None => None,
        };
        self.entries.insert(key.clone(), StoredValue { raw: value, expires_at });
        Ok(())
    }

    async fn remove(&self, key: &CacheKey) -> StoreResult<DeleteStatus> {
        match self.entries.remove(key) {
            Some(_) => Ok(DeleteStatus::Deleted),
            None => Ok(DeleteStatus::Missing),
        }
    }

    fn name(&self) -> &str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use reqcache_core::{CacheEntry, CacheKey};

    use super::*;
    use crate::EntryStore;

    fn key(url: &str) -> CacheKey {
        CacheKey::derive("GET", url, None)
    }

    #[tokio::test]
    async fn write_then_read_round_trips() {
        let store = MemoryStore::new();
        let key = key("http://example.com/a");
        store
            .write(&key, Raw::from_static(b"value"), None)
            .await
            .unwrap();
        assert_eq!(
            store.read(&key).await.unwrap(),
            Some(Raw::from_static(b"value"))
        );
    }

    #[tokio::test]
    async fn expired_values_vanish() {
        let store = MemoryStore::new();
        let key = key("http://example.com/a");
        store
            .write(&key, Raw::from_static(b"value"), Some(Duration::ZERO))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;
        assert_eq!(store.read(&key).await.unwrap(), None);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn store_default_ttl_applies() {
        let store = MemoryStore::with_default_ttl(Duration::ZERO);
        let key = key("http://example.com/a");
        store
            .write(&key, Raw::from_static(b"value"), None)
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;
        assert_eq!(store.read(&key).await.unwrap(), None);
    }

    #[tokio::test]
    async fn remove_reports_status() {
        let store = MemoryStore::new();
        let key = key("http://example.com/a");
        assert_eq!(store.remove(&key).await.unwrap(), DeleteStatus::Missing);
        store
            .write(&key, Raw::from_static(b"value"), None)
            .await
            .unwrap();
        assert_eq!(store.remove(&key).await.unwrap(), DeleteStatus::Deleted);
    }

    #[tokio::test]
    async fn entries_round_trip_through_typed_layer() {
        let request = http::Request::builder()
            .method("GET")
            .uri("http://example.com/a")
            .body(())
            .unwrap();
        let response = http::Response::builder()
            .status(200)
            .header("cache-control", "max-age=60")
            .body(())
            .unwrap();
        let policy = http_cache_semantics::CachePolicy::new(&request, &response);

        let entry = CacheEntry::new(
            policy,
            "http://example.com/a",
            http::StatusCode::OK,
            Raw::from_static(b"hello"),
        );
        let store = MemoryStore::new();
        let key = key("http://example.com/a");
        store.set(&key, &entry, None).await.unwrap();

        let loaded = store.get(&key).await.unwrap().expect("entry present");
        assert_eq!(loaded.status, 200);
        assert_eq!(loaded.url, "http://example.com/a");
        assert_eq!(loaded.body, Raw::from_static(b"hello"));
    }

    #[tokio::test]
    async fn malformed_entries_surface_as_format_errors() {
        let store = MemoryStore::new();
        let key = key("http://example.com/a");
        store
            .write(&key, Raw::from_static(b"not json"), None)
            .await
            .unwrap();
        let err = store.get(&key).await.unwrap_err();
        assert!(matches!(err, StoreError::Format(_)));
    }
}
