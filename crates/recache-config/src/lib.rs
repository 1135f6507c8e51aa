//! # Recache Config
//!
//! Layered configuration for the caching layer: TOML files plus
//! `RECACHE_`-prefixed environment variables, read once at process start.

pub mod loader;
pub mod settings;

pub use loader::{from_default_location, load};
pub use settings::{CacheConfig, RecacheConfig, RedisConfig};
