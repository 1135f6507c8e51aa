//! # Recache Store
//!
//! Store Client for the caching layer: a dyn-compatible [`StoreBackend`]
//! trait with a pooled Redis implementation and an in-memory one, plus
//! pattern scan / bulk-deletion extensions.
//!
//! The connection handle is explicit: [`redis::create_pool`] is called once
//! at startup and the resulting [`RedisStore`] is injected into whatever
//! needs store access. There is no process-global client.

pub mod backend;
pub mod ext;
pub mod memory;
pub mod redis;

pub use backend::{KeyTtl, ScanPage, StoreBackend};
pub use ext::StoreExt;
pub use memory::MemoryStore;
pub use redis::{create_pool, RedisStore};
