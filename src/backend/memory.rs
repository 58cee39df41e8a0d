//! Memory Store Module
//!
//! In-process backing store with an optional byte quota.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use super::BackingStore;
use crate::error::{StoreError, StoreResult};

/// Map-backed store living for the lifetime of the process.
///
/// The quota counts key and value bytes together, the way browser local
/// storage accounts for its limit. `set_available(false)` makes every call
/// fail, which is how tests exercise the cache's degraded paths.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
    quota_bytes: Option<usize>,
    unavailable: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store refusing writes past `quota_bytes`.
    pub fn with_quota(quota_bytes: usize) -> Self {
        Self {
            quota_bytes: Some(quota_bytes),
            ..Self::default()
        }
    }

    /// Toggles simulated unavailability.
    pub fn set_available(&self, available: bool) {
        self.unavailable.store(!available, Ordering::SeqCst);
    }

    /// Bytes currently used by keys and values.
    pub fn used_bytes(&self) -> usize {
        self.entries
            .lock()
            .map(|entries| footprint(&entries))
            .unwrap_or(0)
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, HashMap<String, String>>> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("memory store disabled".to_string()));
        }
        self.entries
            .lock()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".to_string()))
    }
}

fn footprint(entries: &HashMap<String, String>) -> usize {
    entries.iter().map(|(k, v)| k.len() + v.len()).sum()
}

impl BackingStore for MemoryStore {
    fn read(&self, key: &str) -> StoreResult<Option<String>> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> StoreResult<()> {
        let mut entries = self.lock()?;

        if let Some(quota) = self.quota_bytes {
            let replaced = entries.get(key).map(|old| key.len() + old.len()).unwrap_or(0);
            let used = footprint(&entries) - replaced + key.len() + value.len();
            if used > quota {
                return Err(StoreError::QuotaExceeded { used, quota });
            }
        }

        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn delete(&self, key: &str) -> StoreResult<()> {
        self.lock()?.remove(key);
        Ok(())
    }

    fn list_keys(&self) -> StoreResult<Vec<String>> {
        Ok(self.lock()?.keys().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_read_delete() {
        let store = MemoryStore::new();

        store.write("a", "1").unwrap();
        assert_eq!(store.read("a").unwrap().as_deref(), Some("1"));

        store.delete("a").unwrap();
        assert_eq!(store.read("a").unwrap(), None);

        // Deleting an absent key is fine
        store.delete("a").unwrap();
    }

    #[test]
    fn test_list_keys() {
        let store = MemoryStore::new();
        store.write("x", "1").unwrap();
        store.write("y", "2").unwrap();

        let mut keys = store.list_keys().unwrap();
        keys.sort();
        assert_eq!(keys, vec!["x".to_string(), "y".to_string()]);
    }

    #[test]
    fn test_quota_rejects_oversized_write() {
        let store = MemoryStore::with_quota(10);

        store.write("k", "12345").unwrap();
        let result = store.write("big", "123456789");
        assert!(matches!(result, Err(StoreError::QuotaExceeded { quota: 10, .. })));

        // The rejected write left nothing behind
        assert_eq!(store.read("big").unwrap(), None);
        assert_eq!(store.used_bytes(), 6);
    }

    #[test]
    fn test_quota_accounts_for_replaced_value() {
        let store = MemoryStore::with_quota(10);

        store.write("k", "123456789").unwrap();
        // Replacing the value frees the old bytes first
        store.write("k", "abcdefghi").unwrap();
        assert_eq!(store.read("k").unwrap().as_deref(), Some("abcdefghi"));
    }

    #[test]
    fn test_unavailable_store_fails_every_call() {
        let store = MemoryStore::new();
        store.write("k", "v").unwrap();
        store.set_available(false);

        assert!(matches!(store.read("k"), Err(StoreError::Unavailable(_))));
        assert!(store.write("k", "v").is_err());
        assert!(store.delete("k").is_err());
        assert!(store.list_keys().is_err());

        store.set_available(true);
        assert_eq!(store.read("k").unwrap().as_deref(), Some("v"));
    }
}
