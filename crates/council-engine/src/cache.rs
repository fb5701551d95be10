//! Timed cache for evidence lookups

use cached::{Cached, TimedCache};
use serde_json::Value;
use std::time::Duration;
use tokio::sync::RwLock;

/// Cache key: one evidence endpoint for one subject
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EvidenceKey {
    pub subject_id: String,
    pub endpoint: &'static str,
}

impl EvidenceKey {
    pub fn new(subject_id: impl Into<String>, endpoint: &'static str) -> Self {
        Self {
            subject_id: subject_id.into(),
            endpoint,
        }
    }
}

/// Thread-safe cache of raw evidence payloads
pub struct EvidenceCache {
    cache: RwLock<TimedCache<EvidenceKey, Value>>,
}

impl EvidenceCache {
    /// Create a new cache with specified TTL
    pub fn new(ttl: Duration) -> Self {
        Self {
            cache: RwLock::new(TimedCache::with_lifespan(ttl)),
        }
    }

    async fn get(&self, key: &EvidenceKey) -> Option<Value> {
        let mut cache = self.cache.write().await;
        cache.cache_get(key).cloned()
    }

    async fn insert(&self, key: EvidenceKey, value: Value) {
        let mut cache = self.cache.write().await;
        let _ = cache.cache_set(key, value);
    }

    /// Return the cached value or fetch and cache it
    ///
    /// Errors are not cached, so a failed lookup is retried by the next run.
    pub async fn get_or_fetch<F, Fut, E>(&self, key: EvidenceKey, fetcher: F) -> Result<Value, E>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Result<Value, E>>,
    {
        if let Some(value) = self.get(&key).await {
            tracing::debug!(subject = %key.subject_id, endpoint = key.endpoint, "Evidence cache hit");
            return Ok(value);
        }

        let value = fetcher().await?;
        self.insert(key, value.clone()).await;
        Ok(value)
    }
}
