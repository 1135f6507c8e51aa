//! Store backend trait and value types.

use async_trait::async_trait;
use recache_core::RecacheResult;
use std::collections::{HashMap, HashSet};
use std::time::Duration;

/// Remaining lifetime of a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyTtl {
    /// The key exists and expires after the given duration.
    Remaining(Duration),
    /// The key exists and never expires.
    Persistent,
    /// The key does not exist.
    Missing,
}

/// One page of a server-side key scan.
///
/// A `cursor` of zero means the enumeration is complete. Feeding the
/// returned cursor back into [`StoreBackend::scan_page`] resumes the scan,
/// so the full keyspace is never materialized at once.
#[derive(Debug, Clone, Default)]
pub struct ScanPage {
    /// Cursor to resume from, or zero when the scan is exhausted.
    pub cursor: u64,
    /// Keys matched on this page.
    pub keys: Vec<String>,
}

/// Primitive operations against the key-value store.
///
/// This trait is dyn-compatible: values cross it as raw strings, and typed
/// encoding lives in the layer above. Implementations must be safe to share
/// behind an `Arc` and must fail fast (never hang) once closed.
#[async_trait]
pub trait StoreBackend: Send + Sync {
    /// Get a raw value.
    ///
    /// Returns `None` if the key doesn't exist or has expired.
    async fn get(&self, key: &str) -> RecacheResult<Option<String>>;

    /// Set a raw value, optionally with a TTL. `None` means no expiry.
    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> RecacheResult<()>;

    /// Delete a key. Returns the number of keys removed (0 or 1).
    async fn delete(&self, key: &str) -> RecacheResult<u64>;

    /// Delete a batch of keys. Returns the number of keys removed.
    async fn delete_many(&self, keys: &[String]) -> RecacheResult<u64>;

    /// Check if a key exists.
    async fn exists(&self, key: &str) -> RecacheResult<bool>;

    /// Set the expiry of an existing key. Returns `false` if the key does
    /// not exist.
    async fn expire(&self, key: &str, ttl: Duration) -> RecacheResult<bool>;

    /// Remaining lifetime of a key.
    async fn ttl_remaining(&self, key: &str) -> RecacheResult<KeyTtl>;

    /// One page of a restartable pattern scan. `count` is a hint for the
    /// page size, not a guarantee.
    async fn scan_page(&self, pattern: &str, cursor: u64, count: usize)
        -> RecacheResult<ScanPage>;

    /// Set multiple fields on a hash, optionally with a TTL on the whole
    /// hash.
    async fn hash_set(
        &self,
        key: &str,
        fields: &HashMap<String, String>,
        ttl: Option<Duration>,
    ) -> RecacheResult<()>;

    /// Get all fields of a hash. Returns `None` if the hash does not exist.
    async fn hash_get_all(&self, key: &str) -> RecacheResult<Option<HashMap<String, String>>>;

    /// Add members to a set. Returns the number of members newly added.
    async fn set_add(&self, key: &str, members: &[String]) -> RecacheResult<u64>;

    /// All members of a set.
    async fn set_members(&self, key: &str) -> RecacheResult<HashSet<String>>;

    /// Atomically increment a counter, creating it at zero if absent.
    async fn increment(&self, key: &str, by: i64) -> RecacheResult<i64>;

    /// Atomically decrement a counter, creating it at zero if absent.
    async fn decrement(&self, key: &str, by: i64) -> RecacheResult<i64>;

    /// Release the backend's resources. Safe to call multiple times;
    /// operations issued afterwards fail with `NotConnected`.
    async fn close(&self);
}
