//! Unified error types for the recache workspace.

use thiserror::Error;

/// Unified error type for all recache layers.
#[derive(Error, Debug)]
pub enum RecacheError {
    /// The key-value store rejected a connection or command.
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// An operation was issued after the store handle was closed.
    #[error("Store is not connected")]
    NotConnected,

    /// An argument or value cannot be deterministically encoded.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// An invalidation pattern slot has no matching keyword argument.
    #[error("Invalidation slot '{slot}' has no matching keyword argument")]
    PlaceholderResolution { slot: String },

    /// An invalidation pattern template is malformed.
    #[error("Invalid invalidation pattern: {0}")]
    PatternParse(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A wrapped producer function failed.
    #[error("Producer error: {0}")]
    Producer(String),

    /// Generic error wrapper
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl RecacheError {
    /// Creates a store-unavailable error.
    #[must_use]
    pub fn store_unavailable<T: Into<String>>(message: T) -> Self {
        Self::StoreUnavailable(message.into())
    }

    /// Creates a configuration error.
    #[must_use]
    pub fn configuration<T: Into<String>>(message: T) -> Self {
        Self::Configuration(message.into())
    }

    /// Creates a producer error.
    #[must_use]
    pub fn producer<T: Into<String>>(message: T) -> Self {
        Self::Producer(message.into())
    }

    /// Returns a machine-readable error code.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::StoreUnavailable(_) => "STORE_UNAVAILABLE",
            Self::NotConnected => "NOT_CONNECTED",
            Self::Serialization(_) => "SERIALIZATION_ERROR",
            Self::PlaceholderResolution { .. } => "PLACEHOLDER_RESOLUTION_ERROR",
            Self::PatternParse(_) => "PATTERN_PARSE_ERROR",
            Self::Configuration(_) => "CONFIGURATION_ERROR",
            Self::Producer(_) => "PRODUCER_ERROR",
            Self::Other(_) => "INTERNAL_ERROR",
        }
    }

    /// Checks if the cached read path may swallow this error and degrade to
    /// a forced miss instead of failing the caller.
    ///
    /// Store outages must never abort a cached producer call; serialization
    /// and template errors must, so silently incorrect data is never cached.
    #[must_use]
    pub const fn is_degradable(&self) -> bool {
        matches!(self, Self::StoreUnavailable(_) | Self::NotConnected)
    }
}
