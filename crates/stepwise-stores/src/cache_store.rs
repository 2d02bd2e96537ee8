//! CacheStore implementations

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::RwLock;
use std::time::Duration;

use stepwise_core::store::{CacheEntry, CacheStore, StoreError};

/// In-memory TTL cache. Expired entries are evicted lazily on read or by
/// [`CacheStore::clear_expired`].
pub struct InMemoryCacheStore {
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl InMemoryCacheStore {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Number of stored entries, expired ones included
    pub fn len(&self) -> Result<usize, StoreError> {
        let entries = self
            .entries
            .read()
            .map_err(|e| StoreError::Internal(e.to_string()))?;
        Ok(entries.len())
    }

    pub fn is_empty(&self) -> Result<bool, StoreError> {
        self.len().map(|n| n == 0)
    }
}

impl Default for InMemoryCacheStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CacheStore for InMemoryCacheStore {
    async fn get_cache_value(&self, key: &str) -> Result<Option<Value>, StoreError> {
        let now = Utc::now();
        {
            let entries = self
                .entries
                .read()
                .map_err(|e| StoreError::Internal(e.to_string()))?;
            match entries.get(key) {
                None => return Ok(None),
                Some(entry) if !entry.is_expired_at(now) => return Ok(Some(entry.value.clone())),
                Some(_) => {}
            }
        }

        let mut entries = self
            .entries
            .write()
            .map_err(|e| StoreError::Internal(e.to_string()))?;
        if entries.get(key).is_some_and(|entry| entry.is_expired_at(now)) {
            entries.remove(key);
        }
        Ok(None)
    }

    async fn set_cache_value(&self, key: &str, value: Value, ttl: Duration) -> Result<(), StoreError> {
        let mut entries = self
            .entries
            .write()
            .map_err(|e| StoreError::Internal(e.to_string()))?;
        entries.insert(key.to_string(), CacheEntry::new(key, value, ttl));
        Ok(())
    }

    async fn clear_expired(&self) -> Result<usize, StoreError> {
        let now = Utc::now();
        let mut entries = self
            .entries
            .write()
            .map_err(|e| StoreError::Internal(e.to_string()))?;
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired_at(now));
        Ok(before - entries.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_set_and_get() {
        tokio_test::block_on(async {
            let store = InMemoryCacheStore::new();
            store
                .set_cache_value("k", json!({"workflow": []}), Duration::from_secs(60))
                .await
                .expect("set");
            let value = store.get_cache_value("k").await.expect("get");
            assert_eq!(value, Some(json!({"workflow": []})));
            assert_eq!(store.get_cache_value("other").await.expect("get"), None);
        });
    }

    #[test]
    fn test_expired_entry_is_absent_and_evicted() {
        tokio_test::block_on(async {
            let store = InMemoryCacheStore::new();
            store
                .set_cache_value("k", json!(1), Duration::ZERO)
                .await
                .expect("set");
            assert_eq!(store.len().expect("len"), 1);
            assert_eq!(store.get_cache_value("k").await.expect("get"), None);
            assert!(store.is_empty().expect("len"));
        });
    }

    #[test]
    fn test_clear_expired_keeps_live_entries() {
        tokio_test::block_on(async {
            let store = InMemoryCacheStore::new();
            store
                .set_cache_value("dead", json!(1), Duration::ZERO)
                .await
                .expect("set");
            store
                .set_cache_value("live", json!(2), Duration::from_secs(60))
                .await
                .expect("set");

            assert_eq!(store.clear_expired().await.expect("clear"), 1);
            assert_eq!(store.get_cache_value("live").await.expect("get"), Some(json!(2)));
            assert_eq!(store.clear_expired().await.expect("clear"), 0);
        });
    }

    #[test]
    fn test_overwrite_resets_entry() {
        tokio_test::block_on(async {
            let store = InMemoryCacheStore::new();
            store
                .set_cache_value("k", json!(1), Duration::ZERO)
                .await
                .expect("set");
            store
                .set_cache_value("k", json!(2), Duration::from_secs(60))
                .await
                .expect("set");
            assert_eq!(store.get_cache_value("k").await.expect("get"), Some(json!(2)));
        });
    }
}
