//! Pooled Redis implementation of the store backend.

use crate::backend::{KeyTtl, ScanPage, StoreBackend};
use async_trait::async_trait;
use deadpool_redis::{redis::AsyncCommands, Pool};
use recache_core::{RecacheError, RecacheResult};
use std::collections::{HashMap, HashSet};
use std::time::Duration;
use tracing::debug;

/// Redis-backed store.
///
/// Holds a shared connection pool; every operation checks out a pooled
/// connection for the duration of one round-trip. Cloning is cheap and all
/// clones share the same pool.
#[derive(Clone)]
pub struct RedisStore {
    pool: Pool,
}

impl RedisStore {
    /// Create a store over an existing pool.
    #[must_use]
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    /// Get a connection from the pool.
    async fn conn(&self) -> RecacheResult<deadpool_redis::Connection> {
        if self.pool.is_closed() {
            return Err(RecacheError::NotConnected);
        }
        self.pool
            .get()
            .await
            .map_err(|e| RecacheError::StoreUnavailable(format!("Failed to get connection: {}", e)))
    }

    fn ttl_secs(ttl: Duration) -> u64 {
        ttl.as_secs().max(1)
    }
}

#[async_trait]
impl StoreBackend for RedisStore {
    async fn get(&self, key: &str) -> RecacheResult<Option<String>> {
        let mut conn = self.conn().await?;
        let value: Option<String> = conn.get(key).await.map_err(|e| {
            RecacheError::StoreUnavailable(format!("Failed to get key '{}': {}", key, e))
        })?;

        match &value {
            Some(_) => debug!("Cache hit for key '{}'", key),
            None => debug!("Cache miss for key '{}'", key),
        }

        Ok(value)
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> RecacheResult<()> {
        let mut conn = self.conn().await?;
        match ttl {
            Some(ttl) => {
                let secs = Self::ttl_secs(ttl);
                conn.set_ex::<_, _, ()>(key, value, secs).await.map_err(|e| {
                    RecacheError::StoreUnavailable(format!("Failed to set key '{}': {}", key, e))
                })?;
                debug!("Set key '{}' with TTL {}s", key, secs);
            }
            None => {
                conn.set::<_, _, ()>(key, value).await.map_err(|e| {
                    RecacheError::StoreUnavailable(format!("Failed to set key '{}': {}", key, e))
                })?;
                debug!("Set key '{}' without expiry", key);
            }
        }
        Ok(())
    }

    async fn delete(&self, key: &str) -> RecacheResult<u64> {
        let mut conn = self.conn().await?;
        let deleted: u64 = conn.del(key).await.map_err(|e| {
            RecacheError::StoreUnavailable(format!("Failed to delete key '{}': {}", key, e))
        })?;
        Ok(deleted)
    }

    async fn delete_many(&self, keys: &[String]) -> RecacheResult<u64> {
        if keys.is_empty() {
            return Ok(0);
        }
        let mut conn = self.conn().await?;
        let deleted: u64 = conn.del(keys).await.map_err(|e| {
            RecacheError::StoreUnavailable(format!("Failed to delete keys: {}", e))
        })?;
        Ok(deleted)
    }

    async fn exists(&self, key: &str) -> RecacheResult<bool> {
        let mut conn = self.conn().await?;
        let exists: bool = conn.exists(key).await.map_err(|e| {
            RecacheError::StoreUnavailable(format!("Failed to check key '{}': {}", key, e))
        })?;
        Ok(exists)
    }

    async fn expire(&self, key: &str, ttl: Duration) -> RecacheResult<bool> {
        let mut conn = self.conn().await?;
        let set: bool = conn
            .expire(key, Self::ttl_secs(ttl) as i64)
            .await
            .map_err(|e| {
                RecacheError::StoreUnavailable(format!("Failed to expire key '{}': {}", key, e))
            })?;
        Ok(set)
    }

    async fn ttl_remaining(&self, key: &str) -> RecacheResult<KeyTtl> {
        let mut conn = self.conn().await?;
        let ttl: i64 = conn.ttl(key).await.map_err(|e| {
            RecacheError::StoreUnavailable(format!("Failed to read ttl of '{}': {}", key, e))
        })?;
        Ok(match ttl {
            -2 => KeyTtl::Missing,
            -1 => KeyTtl::Persistent,
            secs => KeyTtl::Remaining(Duration::from_secs(secs.max(0) as u64)),
        })
    }

    async fn scan_page(
        &self,
        pattern: &str,
        cursor: u64,
        count: usize,
    ) -> RecacheResult<ScanPage> {
        let mut conn = self.conn().await?;
        let (cursor, keys): (u64, Vec<String>) = redis::cmd("SCAN")
            .arg(cursor)
            .arg("MATCH")
            .arg(pattern)
            .arg("COUNT")
            .arg(count)
            .query_async(&mut conn)
            .await
            .map_err(|e| RecacheError::StoreUnavailable(format!("Failed to scan keys: {}", e)))?;
        Ok(ScanPage { cursor, keys })
    }

    async fn hash_set(
        &self,
        key: &str,
        fields: &HashMap<String, String>,
        ttl: Option<Duration>,
    ) -> RecacheResult<()> {
        if fields.is_empty() {
            return Ok(());
        }
        let mut conn = self.conn().await?;
        let items: Vec<(&str, &str)> = fields
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        conn.hset_multiple::<_, _, _, ()>(key, &items)
            .await
            .map_err(|e| {
                RecacheError::StoreUnavailable(format!("Failed to set hash '{}': {}", key, e))
            })?;
        if let Some(ttl) = ttl {
            conn.expire::<_, ()>(key, Self::ttl_secs(ttl) as i64)
                .await
                .map_err(|e| {
                    RecacheError::StoreUnavailable(format!(
                        "Failed to expire hash '{}': {}",
                        key, e
                    ))
                })?;
        }
        Ok(())
    }

    async fn hash_get_all(&self, key: &str) -> RecacheResult<Option<HashMap<String, String>>> {
        let mut conn = self.conn().await?;
        let fields: HashMap<String, String> = conn.hgetall(key).await.map_err(|e| {
            RecacheError::StoreUnavailable(format!("Failed to get hash '{}': {}", key, e))
        })?;
        Ok(if fields.is_empty() { None } else { Some(fields) })
    }

    async fn set_add(&self, key: &str, members: &[String]) -> RecacheResult<u64> {
        if members.is_empty() {
            return Ok(0);
        }
        let mut conn = self.conn().await?;
        let added: u64 = conn.sadd(key, members).await.map_err(|e| {
            RecacheError::StoreUnavailable(format!("Failed to add to set '{}': {}", key, e))
        })?;
        Ok(added)
    }

    async fn set_members(&self, key: &str) -> RecacheResult<HashSet<String>> {
        let mut conn = self.conn().await?;
        let members: HashSet<String> = conn.smembers(key).await.map_err(|e| {
            RecacheError::StoreUnavailable(format!("Failed to read set '{}': {}", key, e))
        })?;
        Ok(members)
    }

    async fn increment(&self, key: &str, by: i64) -> RecacheResult<i64> {
        let mut conn = self.conn().await?;
        let value: i64 = conn.incr(key, by).await.map_err(|e| {
            RecacheError::StoreUnavailable(format!("Failed to increment '{}': {}", key, e))
        })?;
        Ok(value)
    }

    async fn decrement(&self, key: &str, by: i64) -> RecacheResult<i64> {
        let mut conn = self.conn().await?;
        let value: i64 = conn.decr(key, by).await.map_err(|e| {
            RecacheError::StoreUnavailable(format!("Failed to decrement '{}': {}", key, e))
        })?;
        Ok(value)
    }

    async fn close(&self) {
        // Idempotent: deadpool ignores repeated close calls. Checked-out
        // connections finish their current round-trip; new checkouts fail.
        self.pool.close();
    }
}
