//! Cache layer
//!
//! Stores are untyped (`serde_json::Value` under string keys) so any
//! backend can implement [`CacheStore`]. [`Cache`] adds typed access, with
//! each item supplying its own key through [`Cacheable`].

use async_trait::async_trait;
use dashmap::DashMap;
use pact_types::Cacheable;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::warn;

use crate::SdkError;

/// How long account balances stay fresh
pub const ACCOUNT_TTL: Duration = Duration::from_secs(30);

/// Key-value store behind the cache
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Whether a live entry exists
    async fn has(&self, key: &str) -> bool;

    /// Read a live entry
    async fn get(&self, key: &str) -> Option<Value>;

    /// Write an entry, replacing any previous value. `None` never expires.
    async fn set(&self, key: &str, value: Value, ttl: Option<Duration>);

    /// Persist pending writes
    async fn flush(&self);
}

struct Entry {
    value: Value,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.map_or(true, |at| now < at)
    }
}

/// In-process store with per-entry expiry
#[derive(Default)]
pub struct MemoryCache {
    entries: DashMap<String, Entry>,
}

impl MemoryCache {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries, expired ones included until the next flush
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the store holds no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl CacheStore for MemoryCache {
    async fn has(&self, key: &str) -> bool {
        self.entries
            .get(key)
            .map_or(false, |entry| entry.is_live(Instant::now()))
    }

    async fn get(&self, key: &str) -> Option<Value> {
        let entry = self.entries.get(key)?;
        entry.is_live(Instant::now()).then(|| entry.value.clone())
    }

    async fn set(&self, key: &str, value: Value, ttl: Option<Duration>) {
        let expires_at = ttl.map(|ttl| Instant::now() + ttl);
        self.entries
            .insert(key.to_string(), Entry { value, expires_at });
    }

    /// Nothing to persist; drops expired entries
    async fn flush(&self) {
        let now = Instant::now();
        self.entries.retain(|_, entry| entry.is_live(now));
    }
}

/// Typed handle to a shared cache store
#[derive(Clone)]
pub struct Cache {
    store: Arc<dyn CacheStore>,
}

impl Cache {
    /// Wrap a store
    pub fn new(store: Arc<dyn CacheStore>) -> Self {
        Self { store }
    }

    /// Cache over a fresh [`MemoryCache`]
    pub fn memory() -> Self {
        Self::new(Arc::new(MemoryCache::new()))
    }

    /// Read an item. An entry that no longer decodes reads as absent.
    pub async fn get_item<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = self.store.get(key).await?;
        match serde_json::from_value(value) {
            Ok(item) => Some(item),
            Err(e) => {
                warn!("Discarding undecodable cache entry {}: {}", key, e);
                None
            }
        }
    }

    /// Store an item under its own key
    pub async fn set_item<T: Cacheable + Serialize>(
        &self,
        item: &T,
        ttl: Option<Duration>,
    ) -> Result<(), SdkError> {
        let key = item.cache_key();
        if key.is_empty() {
            return Err(SdkError::InvalidArgument(
                "item has no cache key".to_string(),
            ));
        }
        let value = serde_json::to_value(item)?;
        self.store.set(&key, value, ttl).await;
        Ok(())
    }

    /// Whether a live entry exists
    pub async fn has_item(&self, key: &str) -> bool {
        self.store.has(key).await
    }

    /// Persist pending writes
    pub async fn flush(&self) {
        self.store.flush().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pact_types::ModuleMetadata;

    #[tokio::test]
    async fn test_set_and_get_item() {
        let cache = Cache::memory();
        let module = ModuleMetadata::missing("mainnet01", "0", "coin");
        cache.set_item(&module, None).await.unwrap();

        let key = ModuleMetadata::cache_key_for("mainnet01", "0", "coin");
        assert!(cache.has_item(&key).await);
        let back: ModuleMetadata = cache.get_item(&key).await.unwrap();
        assert_eq!(back, module);
    }

    #[tokio::test]
    async fn test_ttl_expiry() {
        let store = Arc::new(MemoryCache::new());
        store
            .set("k", Value::Bool(true), Some(Duration::from_millis(10)))
            .await;
        assert!(store.has("k").await);

        std::thread::sleep(Duration::from_millis(20));
        assert!(!store.has("k").await);
        assert!(store.get("k").await.is_none());

        store.flush().await;
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_last_write_wins() {
        let store = MemoryCache::new();
        store.set("k", Value::from(1), None).await;
        store.set("k", Value::from(2), None).await;
        assert_eq!(store.get("k").await, Some(Value::from(2)));
    }

    #[tokio::test]
    async fn test_undecodable_entry_reads_as_absent() {
        let store = Arc::new(MemoryCache::new());
        store.set("k", Value::from("not a module"), None).await;
        let cache = Cache::new(store);
        assert!(cache.get_item::<ModuleMetadata>("k").await.is_none());
    }
}
