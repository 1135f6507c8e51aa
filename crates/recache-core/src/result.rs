//! Result type aliases for recache.

use crate::RecacheError;

/// A specialized `Result` type for recache operations.
pub type RecacheResult<T> = Result<T, RecacheError>;

/// A boxed future returning a `RecacheResult`.
pub type BoxFuture<'a, T> =
    std::pin::Pin<Box<dyn std::future::Future<Output = RecacheResult<T>> + Send + 'a>>;
