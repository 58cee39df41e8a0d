//! Feed Cache - client-side caching and incremental loading for a post feed
//!
//! Provides a namespaced TTL cache over a durable key/value store and a
//! viewport-driven loader that fetches more data with at most one request
//! in flight.

pub mod backend;
pub mod cache;
pub mod config;
pub mod error;
pub mod feed;
pub mod loader;
pub mod models;

pub use backend::{BackingStore, FileStore, MemoryStore};
pub use cache::{CacheStats, KeyedTtlCache};
pub use config::Config;
pub use loader::{IncrementalLoader, Viewport};
