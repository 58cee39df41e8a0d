//! Backing Store Module
//!
//! Raw string key/value stores the cache persists its records into. A store
//! is shared process-wide, possibly by several caches and by unrelated
//! application state, so callers partition it by key prefix.

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use crate::error::StoreResult;

// == Backing Store ==
/// Durable string key/value storage.
///
/// Each call is atomic on its own; no multi-key transactions are offered.
pub trait BackingStore: Send + Sync {
    /// Returns the raw value under `key`, or None if absent.
    fn read(&self, key: &str) -> StoreResult<Option<String>>;

    /// Stores `value` under `key`, replacing any previous value.
    fn write(&self, key: &str, value: &str) -> StoreResult<()>;

    /// Removes `key`. Absent keys are not an error.
    fn delete(&self, key: &str) -> StoreResult<()>;

    /// Lists every key currently stored, in no particular order.
    fn list_keys(&self) -> StoreResult<Vec<String>>;
}
