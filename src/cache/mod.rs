//! Cache Module
//!
//! Provides a namespaced key/value cache with lazy TTL expiration over a
//! pluggable backing store.

mod clock;
mod entry;
mod stats;
mod store;


// Re-export public types
pub use clock::{Clock, ManualClock, SystemClock};
pub use entry::CacheEntry;
pub use stats::CacheStats;
pub use store::KeyedTtlCache;

// == Public Constants ==
/// TTL applied when the caller doesn't give one (5 minutes)
pub const DEFAULT_TTL_MS: u64 = 5 * 60 * 1000;

/// Key prefix separating cache records from other data in the backing store
pub const DEFAULT_NAMESPACE: &str = "feedcache:";
