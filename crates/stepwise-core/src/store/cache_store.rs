use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::StoreError;

/// A cached value with an absolute expiry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub key: String,
    pub value: Value,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl CacheEntry {
    pub fn new(key: impl Into<String>, value: Value, ttl: Duration) -> Self {
        let created_at = Utc::now();
        let expires_at = chrono::Duration::from_std(ttl)
            .ok()
            .and_then(|ttl| created_at.checked_add_signed(ttl))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        Self {
            key: key.into(),
            value,
            created_at,
            expires_at,
        }
    }

    /// An entry is expired at and after `expires_at`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// TTL key/value storage
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Read a value. Expired entries read as absent and are evicted.
    async fn get_cache_value(&self, key: &str) -> Result<Option<Value>, StoreError>;

    async fn set_cache_value(&self, key: &str, value: Value, ttl: Duration) -> Result<(), StoreError>;

    /// Evict every expired entry, returning how many were removed
    async fn clear_expired(&self) -> Result<usize, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_entry_expiry_boundary() {
        let entry = CacheEntry::new("k", json!(1), Duration::from_secs(60));
        assert!(!entry.is_expired_at(entry.created_at));
        assert!(entry.is_expired_at(entry.expires_at));

        let zero = CacheEntry::new("k", json!(1), Duration::ZERO);
        assert!(zero.is_expired_at(zero.created_at));
    }

    #[test]
    fn test_huge_ttl_saturates() {
        let entry = CacheEntry::new("k", json!(1), Duration::from_secs(u64::MAX));
        assert!(!entry.is_expired_at(Utc::now()));
    }
}
