//! Cache Entry Module
//!
//! Defines the record persisted in the backing store for every cached key.

use serde::{Deserialize, Serialize};
use serde_json::Value;

// == Cache Entry ==
/// A single cache record as it is written to the backing store.
///
/// Serialized as `{"key", "value", "storedAt", "ttl"}`; the value is opaque
/// JSON and never inspected by the cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry {
    /// Caller-facing key, without the namespace prefix
    pub key: String,
    /// The stored payload
    pub value: Value,
    /// Insertion timestamp (Unix milliseconds)
    pub stored_at: u64,
    /// Lifetime in milliseconds
    #[serde(rename = "ttl")]
    pub ttl_ms: u64,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates a new entry stored at `now` that lives for `ttl_ms`.
    pub fn new(key: impl Into<String>, value: Value, now: u64, ttl_ms: u64) -> Self {
        Self {
            key: key.into(),
            value,
            stored_at: now,
            ttl_ms,
        }
    }

    // == Expires At ==
    /// Last millisecond at which the entry is still live.
    pub fn expires_at(&self) -> u64 {
        self.stored_at.saturating_add(self.ttl_ms)
    }

    // == Is Live ==
    /// Checks whether the entry may be served at time `now`.
    ///
    /// Boundary condition: the entry is live while `now <= stored_at + ttl`,
    /// so it is still served at exactly its expiry instant and becomes
    /// expired one millisecond later.
    pub fn is_live_at(&self, now: u64) -> bool {
        now <= self.expires_at()
    }

    // == Time To Live ==
    /// Returns remaining lifetime in milliseconds at `now`, 0 once expired.
    pub fn ttl_remaining_ms(&self, now: u64) -> u64 {
        self.expires_at().saturating_sub(now)
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_entry_serializes_with_wire_field_names() {
        let entry = CacheEntry::new("posts:p1", json!({"title": "A"}), 1_000, 300_000);
        let encoded = serde_json::to_value(&entry).unwrap();

        assert_eq!(
            encoded,
            json!({
                "key": "posts:p1",
                "value": {"title": "A"},
                "storedAt": 1_000,
                "ttl": 300_000
            })
        );
    }

    #[test]
    fn test_entry_rejects_missing_fields() {
        let result = serde_json::from_str::<CacheEntry>(r#"{"key":"k","value":1}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_liveness_boundary() {
        let entry = CacheEntry::new("k", json!(1), 10_000, 500);

        assert!(entry.is_live_at(10_000));
        assert!(entry.is_live_at(10_499));
        assert!(entry.is_live_at(10_500), "Entry should be live at its expiry instant");
        assert!(!entry.is_live_at(10_501), "Entry should be expired past its expiry instant");
    }

    #[test]
    fn test_zero_ttl_is_live_only_at_store_time() {
        let entry = CacheEntry::new("k", json!(null), 42, 0);
        assert!(entry.is_live_at(42));
        assert!(!entry.is_live_at(43));
    }

    #[test]
    fn test_ttl_remaining() {
        let entry = CacheEntry::new("k", json!("v"), 1_000, 10_000);

        assert_eq!(entry.ttl_remaining_ms(1_000), 10_000);
        assert_eq!(entry.ttl_remaining_ms(6_000), 5_000);
        assert_eq!(entry.ttl_remaining_ms(20_000), 0);
    }

    #[test]
    fn test_expires_at_saturates() {
        let entry = CacheEntry::new("k", json!(1), u64::MAX - 5, 100);
        assert_eq!(entry.expires_at(), u64::MAX);
        assert!(entry.is_live_at(u64::MAX));
    }
}
