//! Redis-backed store implementation.

mod store;

pub use store::RedisStore;

use deadpool_redis::{Config, Pool, Runtime};
use recache_core::{RecacheError, RecacheResult};
use recache_config::RedisConfig;
use tracing::info;

/// Create a Redis connection pool.
///
/// The pool is bounded by `config.pool_size` and verified with a `PING`
/// before being handed out. The returned handle is the process's single
/// store connection: build it once at startup and inject it wherever store
/// access is needed.
pub async fn create_pool(config: &RedisConfig) -> RecacheResult<Pool> {
    info!("Creating Redis connection pool...");

    let cfg = Config::from_url(config.url());

    let pool = cfg
        .builder()
        .map_err(|e| RecacheError::Configuration(format!("Invalid Redis config: {}", e)))?
        .max_size(config.pool_size)
        .runtime(Runtime::Tokio1)
        .build()
        .map_err(|e| RecacheError::Configuration(format!("Failed to create pool: {}", e)))?;

    // Test connection
    let mut conn = pool
        .get()
        .await
        .map_err(|e| RecacheError::StoreUnavailable(format!("Failed to connect: {}", e)))?;
    redis::cmd("PING")
        .query_async::<String>(&mut *conn)
        .await
        .map_err(|e| RecacheError::StoreUnavailable(format!("PING failed: {}", e)))?;

    info!("Redis connection pool created successfully");

    Ok(pool)
}
