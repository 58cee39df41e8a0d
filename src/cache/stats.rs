//! Cache Statistics Module
//!
//! Tracks cache diagnostics: hits, misses and the approximate entry count.

use serde::Serialize;

// == Cache Stats ==
/// Snapshot of cache diagnostics.
///
/// `size` is a counter rather than an exact key count: every successful
/// `set` adds one (overwrites included), removals and lookup evictions
/// subtract one, and it never drops below zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Number of lookups that returned a live value
    pub hits: u64,
    /// Number of lookups that found nothing, an expired or an unreadable entry
    pub misses: u64,
    /// Entries believed to be stored
    pub size: u64,
}

impl CacheStats {
    // == Constructor ==
    /// Creates a new CacheStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Calculates the cache hit rate.
    ///
    /// Returns hits / (hits + misses), or 0.0 if no lookups have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    pub(crate) fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub(crate) fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub(crate) fn record_insert(&mut self) {
        self.size += 1;
    }

    pub(crate) fn record_removal(&mut self) {
        self.size = self.size.saturating_sub(1);
    }

    pub(crate) fn reset(&mut self) {
        *self = Self::default();
    }
}
