//! Namespaced manual cache control.

use crate::codec;
use recache_config::CacheConfig;
use recache_core::RecacheResult;
use recache_store::{StoreBackend, StoreExt};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Explicit cache control scoped to one namespace.
///
/// For call sites that need finer control than the combinators: every key
/// is prefixed with `{namespace}:`, so [`ScopedCache::clear_all`] removes
/// exactly this manager's entries and nothing else.
///
/// Unlike the read-through combinator, the explicit operations propagate
/// store errors; the caller decides whether a cache failure matters.
pub struct ScopedCache {
    store: Arc<dyn StoreBackend>,
    namespace: String,
    default_ttl: Duration,
}

impl ScopedCache {
    /// Creates a manager for `namespace` with a default TTL.
    #[must_use]
    pub fn new(
        store: Arc<dyn StoreBackend>,
        namespace: impl Into<String>,
        default_ttl: Duration,
    ) -> Self {
        Self {
            store,
            namespace: namespace.into(),
            default_ttl,
        }
    }

    /// Creates a manager from configuration: the namespace is nested under
    /// the configured key prefix (`{key_prefix}:{namespace}:{key}`) and the
    /// default TTL comes from the config.
    #[must_use]
    pub fn from_config(
        store: Arc<dyn StoreBackend>,
        config: &CacheConfig,
        namespace: impl Into<String>,
    ) -> Self {
        Self {
            store,
            namespace: format!("{}:{}", config.key_prefix, namespace.into()),
            default_ttl: config.default_ttl(),
        }
    }

    /// The namespace prefix applied to every key.
    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    fn scoped(&self, key: &str) -> String {
        format!("{}:{}", self.namespace, key)
    }

    /// Caches a value under a namespace-relative key.
    pub async fn set<T: Serialize>(
        &self,
        key: &str,
        value: &T,
        ttl: Option<Duration>,
    ) -> RecacheResult<()> {
        let raw = codec::encode(value)?;
        self.store
            .set(&self.scoped(key), &raw, Some(ttl.unwrap_or(self.default_ttl)))
            .await
    }

    /// Fetches a cached value.
    ///
    /// Returns `None` if the key doesn't exist or has expired.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> RecacheResult<Option<T>> {
        match self.store.get(&self.scoped(key)).await? {
            Some(raw) => Ok(Some(codec::decode(&raw)?)),
            None => Ok(None),
        }
    }

    /// Deletes a cached value. Returns `true` if an entry existed.
    pub async fn delete(&self, key: &str) -> RecacheResult<bool> {
        Ok(self.store.delete(&self.scoped(key)).await? > 0)
    }

    /// Checks whether a key exists.
    pub async fn exists(&self, key: &str) -> RecacheResult<bool> {
        self.store.exists(&self.scoped(key)).await
    }

    /// Deletes every entry in this namespace. Returns the number removed.
    pub async fn clear_all(&self) -> RecacheResult<u64> {
        let pattern = format!("{}:*", self.namespace);
        let deleted = self.store.delete_matching(&pattern).await?;
        debug!(namespace = %self.namespace, deleted, "Cleared namespace");
        Ok(deleted)
    }

    /// Fetches a cached value, or computes and caches it on a miss.
    ///
    /// Same cache-aside semantics as the read-through combinator: store
    /// failures degrade to a forced miss with a warning rather than failing
    /// the call, and producer failures propagate uncached. A synchronous
    /// producer is just an `async` block that never awaits; nothing here
    /// blocks the calling task on unrelated work.
    pub async fn get_or_set<T, F, Fut>(
        &self,
        key: &str,
        producer: F,
        ttl: Option<Duration>,
    ) -> RecacheResult<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = RecacheResult<T>>,
    {
        let scoped = self.scoped(key);

        match self.store.get(&scoped).await {
            Ok(Some(raw)) => match codec::decode::<T>(&raw) {
                Ok(value) => return Ok(value),
                Err(e) => warn!(key = %scoped, error = %e, "Cached value failed to decode, recomputing"),
            },
            Ok(None) => {}
            Err(e) => warn!(key = %scoped, error = %e, "Cache read failed, treating as miss"),
        }

        let value = producer().await?;

        let raw = codec::encode(&value)?;
        if let Err(e) = self
            .store
            .set(&scoped, &raw, Some(ttl.unwrap_or(self.default_ttl)))
            .await
        {
            warn!(key = %scoped, error = %e, "Cache write failed");
        }

        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use recache_store::MemoryStore;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn manager(store: Arc<MemoryStore>) -> ScopedCache {
        ScopedCache::new(store, "user", Duration::from_secs(60))
    }

    #[tokio::test]
    async fn test_keys_are_namespaced() {
        let store = Arc::new(MemoryStore::new());
        let cache = manager(store.clone());

        cache.set("1", &"alice", None).await.unwrap();
        assert!(store.exists("user:1").await.unwrap());
        assert!(cache.exists("1").await.unwrap());
    }

    #[tokio::test]
    async fn test_from_config_nests_under_key_prefix() {
        let store = Arc::new(MemoryStore::new());
        let config = CacheConfig::default();
        let cache = ScopedCache::from_config(store.clone(), &config, "user");

        assert_eq!(cache.namespace(), "recache:user");
        cache.set("1", &"alice", None).await.unwrap();
        assert!(store.exists("recache:user:1").await.unwrap());

        // Entries of a sibling namespace under the same prefix survive a
        // clear.
        let posts = ScopedCache::from_config(store.clone(), &config, "post");
        posts.set("1", &"p", None).await.unwrap();
        cache.clear_all().await.unwrap();
        assert!(!store.exists("recache:user:1").await.unwrap());
        assert!(store.exists("recache:post:1").await.unwrap());
    }

    #[tokio::test]
    async fn test_typed_round_trip() {
        let store = Arc::new(MemoryStore::new());
        let cache = manager(store);

        let profile = vec!["alice".to_string(), "admin".to_string()];
        cache.set("1:roles", &profile, None).await.unwrap();
        let loaded: Option<Vec<String>> = cache.get("1:roles").await.unwrap();
        assert_eq!(loaded, Some(profile));

        let missing: Option<Vec<String>> = cache.get("2:roles").await.unwrap();
        assert_eq!(missing, None);
    }

    #[tokio::test]
    async fn test_delete() {
        let store = Arc::new(MemoryStore::new());
        let cache = manager(store);

        cache.set("1", &1, None).await.unwrap();
        assert!(cache.delete("1").await.unwrap());
        assert!(!cache.delete("1").await.unwrap());
        assert!(!cache.exists("1").await.unwrap());
    }

    #[tokio::test]
    async fn test_clear_all_respects_namespace_boundary() {
        let store = Arc::new(MemoryStore::new());
        let users = ScopedCache::new(store.clone(), "user", Duration::from_secs(60));
        let posts = ScopedCache::new(store.clone(), "post", Duration::from_secs(60));

        users.set("1", &"a", None).await.unwrap();
        users.set("2", &"b", None).await.unwrap();
        posts.set("1", &"p", None).await.unwrap();

        let deleted = users.clear_all().await.unwrap();
        assert_eq!(deleted, 2);
        assert!(!users.exists("1").await.unwrap());
        assert!(posts.exists("1").await.unwrap());
    }

    #[tokio::test]
    async fn test_get_or_set_computes_once() {
        let store = Arc::new(MemoryStore::new());
        let cache = manager(store);
        let calls = AtomicUsize::new(0);

        for _ in 0..3 {
            let value: i64 = cache
                .get_or_set(
                    "1:count",
                    || {
                        calls.fetch_add(1, Ordering::SeqCst);
                        async { Ok(42) }
                    },
                    None,
                )
                .await
                .unwrap();
            assert_eq!(value, 42);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_get_or_set_custom_ttl_expires() {
        let store = Arc::new(MemoryStore::new());
        let cache = manager(store);
        let calls = AtomicUsize::new(0);

        let produce = || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Ok("v".to_string()) }
        };

        let _: String = cache
            .get_or_set("k", produce, Some(Duration::from_millis(30)))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(60)).await;
        let _: String = cache
            .get_or_set("k", produce, Some(Duration::from_millis(30)))
            .await
            .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_operations_after_close_propagate() {
        let store = Arc::new(MemoryStore::new());
        let cache = manager(store.clone());
        store.close().await;

        let err = cache.set("1", &1, None).await.unwrap_err();
        assert_eq!(err.error_code(), "NOT_CONNECTED");
        let err = cache.exists("1").await.unwrap_err();
        assert!(err.is_degradable());
    }
}
