//! Configuration loader with layered sources.

use crate::RecacheConfig;
use config::{Config, Environment, File};
use recache_core::{RecacheError, RecacheResult};
use std::path::Path;
use tracing::{debug, info};

/// Loads configuration from the default location (`./config`).
pub fn from_default_location() -> RecacheResult<RecacheConfig> {
    load("./config")
}

/// Loads configuration from the given directory.
///
/// Sources are layered in order, later entries overriding earlier ones:
/// 1. `{config_dir}/default.toml`
/// 2. `{config_dir}/{RECACHE_ENVIRONMENT}.toml`
/// 3. `{config_dir}/local.toml` (not committed to version control)
/// 4. Environment variables with the `RECACHE_` prefix and `__` separator,
///    e.g. `RECACHE_REDIS__HOST=cache.internal`.
///
/// The configuration is read once at process start; there is no runtime
/// reload.
pub fn load(config_dir: impl AsRef<str>) -> RecacheResult<RecacheConfig> {
    let config_dir = config_dir.as_ref();

    // Load .env file if present
    if let Err(e) = dotenvy::dotenv() {
        debug!("No .env file found or error loading it: {}", e);
    }

    let environment =
        std::env::var("RECACHE_ENVIRONMENT").unwrap_or_else(|_| "development".to_string());

    info!("Loading configuration for environment: {}", environment);

    let mut builder = Config::builder();

    let default_path = format!("{}/default.toml", config_dir);
    if Path::new(&default_path).exists() {
        debug!("Loading default config from: {}", default_path);
        builder = builder.add_source(File::with_name(&default_path).required(false));
    }

    let env_path = format!("{}/{}.toml", config_dir, environment);
    if Path::new(&env_path).exists() {
        debug!("Loading environment config from: {}", env_path);
        builder = builder.add_source(File::with_name(&env_path).required(false));
    }

    let local_path = format!("{}/local.toml", config_dir);
    if Path::new(&local_path).exists() {
        debug!("Loading local config from: {}", local_path);
        builder = builder.add_source(File::with_name(&local_path).required(false));
    }

    builder = builder.add_source(
        Environment::with_prefix("RECACHE")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder
        .build()
        .map_err(|e| RecacheError::Configuration(e.to_string()))?;

    let recache_config: RecacheConfig = config
        .try_deserialize()
        .map_err(|e| RecacheError::Configuration(e.to_string()))?;

    validate(&recache_config)?;

    Ok(recache_config)
}

/// Validates critical configuration values.
fn validate(config: &RecacheConfig) -> RecacheResult<()> {
    if config.redis.host.is_empty() {
        return Err(RecacheError::configuration("redis.host must not be empty"));
    }
    if config.redis.pool_size == 0 {
        return Err(RecacheError::configuration(
            "redis.pool_size must be greater than zero",
        ));
    }
    if config.cache.default_ttl_secs == 0 {
        return Err(RecacheError::configuration(
            "cache.default_ttl_secs must be greater than zero",
        ));
    }
    Ok(())
}
