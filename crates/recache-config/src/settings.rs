//! Configuration structures.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root configuration for the caching layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecacheConfig {
    /// Redis connection configuration.
    #[serde(default)]
    pub redis: RedisConfig,

    /// Cache behavior configuration.
    #[serde(default)]
    pub cache: CacheConfig,
}

impl Default for RecacheConfig {
    fn default() -> Self {
        Self {
            redis: RedisConfig::default(),
            cache: CacheConfig::default(),
        }
    }
}

/// Redis connection configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisConfig {
    /// Redis host.
    #[serde(default = "default_host")]
    pub host: String,

    /// Redis port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Redis database index.
    #[serde(default)]
    pub db: u8,

    /// Optional password.
    #[serde(default)]
    pub password: Option<String>,

    /// Connection pool size.
    #[serde(default = "default_pool_size")]
    pub pool_size: usize,

    /// Connection timeout in seconds.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            db: 0,
            password: None,
            pool_size: default_pool_size(),
            connect_timeout_secs: default_connect_timeout(),
        }
    }
}

impl RedisConfig {
    /// Composes the connection URL from its parts.
    #[must_use]
    pub fn url(&self) -> String {
        match &self.password {
            Some(password) => format!(
                "redis://:{}@{}:{}/{}",
                password, self.host, self.port, self.db
            ),
            None => format!("redis://{}:{}/{}", self.host, self.port, self.db),
        }
    }

    /// Returns the connection timeout as a `Duration`.
    #[must_use]
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    6379
}

fn default_pool_size() -> usize {
    10
}

fn default_connect_timeout() -> u64 {
    5
}

/// Cache behavior configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Default TTL for cached entries, in seconds.
    #[serde(default = "default_ttl_secs")]
    pub default_ttl_secs: u64,

    /// Key prefix applied by scoped managers constructed from
    /// configuration.
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            default_ttl_secs: default_ttl_secs(),
            key_prefix: default_key_prefix(),
        }
    }
}

impl CacheConfig {
    /// Returns the default TTL as a `Duration`.
    #[must_use]
    pub fn default_ttl(&self) -> Duration {
        Duration::from_secs(self.default_ttl_secs)
    }
}

fn default_ttl_secs() -> u64 {
    300
}

fn default_key_prefix() -> String {
    "recache".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RecacheConfig::default();
        assert_eq!(config.redis.host, "localhost");
        assert_eq!(config.redis.port, 6379);
        assert_eq!(config.redis.pool_size, 10);
        assert_eq!(config.cache.default_ttl_secs, 300);
        assert_eq!(config.cache.default_ttl(), Duration::from_secs(300));
    }

    #[test]
    fn test_url_without_password() {
        let redis = RedisConfig::default();
        assert_eq!(redis.url(), "redis://localhost:6379/0");
    }

    #[test]
    fn test_url_with_password() {
        let redis = RedisConfig {
            password: Some("s3cret".to_string()),
            db: 2,
            ..RedisConfig::default()
        };
        assert_eq!(redis.url(), "redis://:s3cret@localhost:6379/2");
    }

    #[test]
    fn test_partial_deserialization_fills_defaults() {
        let config: RecacheConfig =
            serde_json::from_str(r#"{"redis": {"host": "cache.internal"}}"#).unwrap();
        assert_eq!(config.redis.host, "cache.internal");
        assert_eq!(config.redis.port, 6379);
        assert_eq!(config.cache.key_prefix, "recache");
    }
}
