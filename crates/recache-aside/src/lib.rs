//! # Recache Aside
//!
//! Cache-aside building blocks over a [`recache_store::StoreBackend`]:
//!
//! - [`key`]: deterministic `{namespace}:{operation}:{digest}` key
//!   derivation from captured call arguments.
//! - [`codec`]: tagged transport encoding of cache values.
//! - [`pattern`]: typed invalidation pattern templates.
//! - [`aside`]: the [`CachedOp`] read-through and [`InvalidatingOp`]
//!   write-invalidation combinators.
//! - [`manager`]: [`ScopedCache`], namespaced manual cache control.
//!
//! # Example
//!
//! ```rust,ignore
//! use recache_aside::{CachedOp, CallArgs};
//! use std::sync::Arc;
//!
//! let lookup = CachedOp::new(store, "get_user").namespace("user");
//!
//! let args = CallArgs::new().arg(&user_id)?;
//! let user: User = lookup
//!     .call(&args, || async { db.fetch_user(user_id).await })
//!     .await?;
//!
//! // After an update elsewhere:
//! lookup.evict(&args).await?;
//! ```

pub mod aside;
pub mod codec;
pub mod key;
pub mod manager;
pub mod pattern;

pub use aside::{CachedOp, InvalidatingOp, DEFAULT_TTL};
pub use key::{build_key, CallArgs};
pub use manager::ScopedCache;
pub use pattern::InvalidationPattern;
