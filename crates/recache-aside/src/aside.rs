//! Cache-aside combinators.
//!
//! Instead of implicitly wrapping functions, call sites compose explicitly:
//! a [`CachedOp`] wraps a read producer with check-cache / compute-on-miss /
//! populate semantics, and an [`InvalidatingOp`] runs a write producer and
//! busts matching cache entries afterwards.

use crate::codec;
use crate::key::{build_key, CallArgs};
use crate::pattern::InvalidationPattern;
use recache_core::RecacheResult;
use recache_store::{StoreBackend, StoreExt};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Default TTL for cached results (5 minutes).
pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

/// Key derivation strategy: the default namespace/operation/digest scheme,
/// or a caller-supplied function.
type KeyFn = Arc<dyn Fn(&CallArgs) -> String + Send + Sync>;

/// A read operation with cache-aside semantics.
///
/// Calling [`CachedOp::call`] consults the store first; on a hit the
/// producer is never invoked. On a miss the producer runs and its result is
/// stored with this operation's TTL. Store failures degrade to a forced
/// miss with a warning; they never fail the call. Producer failures
/// propagate unchanged and are never cached.
///
/// There is no distinction between a cache miss and a cached value equal to
/// the store's absent sentinel: a producer whose legitimate result encodes
/// as "absent" will be recomputed every call.
pub struct CachedOp {
    store: Arc<dyn StoreBackend>,
    operation: String,
    namespace: Option<String>,
    ttl: Duration,
    key_fn: Option<KeyFn>,
}

impl CachedOp {
    /// Creates a cached operation with the default TTL and no namespace.
    #[must_use]
    pub fn new(store: Arc<dyn StoreBackend>, operation: impl Into<String>) -> Self {
        Self {
            store,
            operation: operation.into(),
            namespace: None,
            ttl: DEFAULT_TTL,
            key_fn: None,
        }
    }

    /// Sets the key namespace.
    #[must_use]
    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Sets the entry TTL.
    #[must_use]
    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Overrides key derivation with a caller-supplied function.
    #[must_use]
    pub fn key_fn(mut self, f: impl Fn(&CallArgs) -> String + Send + Sync + 'static) -> Self {
        self.key_fn = Some(Arc::new(f));
        self
    }

    fn key_for(&self, args: &CallArgs) -> String {
        match &self.key_fn {
            Some(f) => f(args),
            None => build_key(self.namespace.as_deref(), &self.operation, args),
        }
    }

    /// Runs the operation for the given arguments.
    pub async fn call<T, F, Fut>(&self, args: &CallArgs, producer: F) -> RecacheResult<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = RecacheResult<T>>,
    {
        let key = self.key_for(args);

        match self.store.get(&key).await {
            Ok(Some(raw)) => match codec::decode::<T>(&raw) {
                Ok(value) => {
                    debug!(key = %key, "Cache hit");
                    return Ok(value);
                }
                Err(e) => {
                    warn!(key = %key, error = %e, "Cached value failed to decode, recomputing");
                }
            },
            Ok(None) => debug!(key = %key, "Cache miss"),
            Err(e) => warn!(key = %key, error = %e, "Cache read failed, treating as miss"),
        }

        let value = producer().await?;

        // Encoding failures are real errors: never cache silently wrong
        // data. Store write failures only cost the next caller a
        // recomputation.
        let raw = codec::encode(&value)?;
        if let Err(e) = self.store.set(&key, &raw, Some(self.ttl)).await {
            warn!(key = %key, error = %e, "Cache write failed");
        }

        Ok(value)
    }

    /// Deletes the cache entry for exactly this argument combination.
    ///
    /// Returns `true` if an entry existed. Independent of the read path;
    /// entries for other arguments of the same operation are untouched.
    pub async fn evict(&self, args: &CallArgs) -> RecacheResult<bool> {
        let key = self.key_for(args);
        let removed = self.store.delete(&key).await?;
        debug!(key = %key, removed, "Evicted cache entry");
        Ok(removed > 0)
    }
}

/// A write operation that invalidates matching cache entries on success.
///
/// The producer runs first; only when it completes without error is the
/// pattern resolved against the call's keyword arguments and matching keys
/// deleted. A failed write never clears caches. If invalidation itself
/// fails, the write's result is still returned and the staleness window
/// (bounded by the entries' TTL) is logged loudly.
pub struct InvalidatingOp {
    store: Arc<dyn StoreBackend>,
    pattern: InvalidationPattern,
}

impl InvalidatingOp {
    /// Creates an invalidating operation for a parsed pattern.
    #[must_use]
    pub fn new(store: Arc<dyn StoreBackend>, pattern: InvalidationPattern) -> Self {
        Self { store, pattern }
    }

    /// Runs the producer, then invalidates.
    pub async fn call<T, F, Fut>(&self, args: &CallArgs, producer: F) -> RecacheResult<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = RecacheResult<T>>,
    {
        let result = producer().await?;

        match self.pattern.resolve(args) {
            Ok(resolved) => match self.store.delete_matching(&resolved).await {
                Ok(deleted) => {
                    debug!(pattern = %resolved, deleted, "Invalidated cache entries");
                }
                Err(e) => {
                    warn!(
                        pattern = %resolved,
                        error = %e,
                        "Cache invalidation failed; stale entries persist until TTL expiry"
                    );
                }
            },
            Err(e) => {
                warn!(
                    template = %self.pattern.as_template(),
                    error = %e,
                    "Invalidation pattern did not resolve; cache was not invalidated"
                );
            }
        }

        Ok(result)
    }
}
