//! Keyed TTL Cache Module
//!
//! Read-through cache engine persisting entries into a shared backing store
//! under a namespace prefix, with lazy TTL expiry and hit/miss accounting.

use std::future::Future;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::backend::BackingStore;
use crate::cache::{CacheEntry, CacheStats, Clock, SystemClock, DEFAULT_NAMESPACE, DEFAULT_TTL_MS};
use crate::config::Config;
use crate::error::StoreError;

// == Keyed TTL Cache ==
/// Expiring key/value cache over a [`BackingStore`].
///
/// Every operation is best-effort: store failures and unreadable records are
/// logged and turned into a miss or a no-op, never returned to the caller.
/// Expiry is only checked on lookup; nothing sweeps the store in the
/// background.
pub struct KeyedTtlCache {
    /// Shared raw key/value storage
    backend: Arc<dyn BackingStore>,
    /// Time source for TTL checks
    clock: Arc<dyn Clock>,
    /// Prefix owning this cache's slice of the backing store
    namespace: String,
    /// TTL in milliseconds for entries stored without one
    default_ttl_ms: u64,
    /// Diagnostics
    stats: CacheStats,
}

impl KeyedTtlCache {
    // == Constructor ==
    /// Creates a cache over `backend` owning keys prefixed with `namespace`.
    ///
    /// An empty namespace would let `clear` wipe unrelated data, so it is
    /// replaced by [`DEFAULT_NAMESPACE`].
    pub fn new(backend: Arc<dyn BackingStore>, namespace: impl Into<String>) -> Self {
        let mut namespace = namespace.into();
        if namespace.is_empty() {
            namespace = DEFAULT_NAMESPACE.to_string();
        }

        Self {
            backend,
            clock: Arc::new(SystemClock),
            namespace,
            default_ttl_ms: DEFAULT_TTL_MS,
            stats: CacheStats::new(),
        }
    }

    /// Creates a cache using the namespace and default TTL from `config`.
    pub fn from_config(backend: Arc<dyn BackingStore>, config: &Config) -> Self {
        Self::new(backend, config.namespace.clone()).with_default_ttl(config.default_ttl_ms)
    }

    /// Replaces the TTL applied when `set` is called without one.
    pub fn with_default_ttl(mut self, ttl_ms: u64) -> Self {
        self.default_ttl_ms = ttl_ms;
        self
    }

    /// Replaces the time source.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn default_ttl_ms(&self) -> u64 {
        self.default_ttl_ms
    }

    fn raw_key(&self, key: &str) -> String {
        format!("{}{}", self.namespace, key)
    }

    // == Get ==
    /// Returns the live value stored under `key`.
    ///
    /// Absent, expired and unreadable entries all count as a miss. Expired
    /// and corrupt records are deleted from the backing store on the way.
    /// A record whose payload doesn't decode as `T` is a miss but is kept,
    /// since another reader may expect a different shape.
    pub fn get<T: DeserializeOwned>(&mut self, key: &str) -> Option<T> {
        let raw_key = self.raw_key(key);

        let raw = match self.backend.read(&raw_key) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                self.stats.record_miss();
                return None;
            }
            Err(e) => {
                warn!("Cache read failed for {}: {}", key, e);
                self.stats.record_miss();
                return None;
            }
        };

        let entry: CacheEntry = match serde_json::from_str(&raw) {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Discarding corrupt cache entry {}: {}", key, e);
                self.evict(&raw_key);
                self.stats.record_miss();
                return None;
            }
        };

        let now = self.clock.now_ms();
        if !entry.is_live_at(now) {
            debug!(
                "Cache entry {} expired {}ms ago",
                key,
                now - entry.expires_at()
            );
            self.evict(&raw_key);
            self.stats.record_miss();
            return None;
        }

        match serde_json::from_value(entry.value) {
            Ok(value) => {
                self.stats.record_hit();
                Some(value)
            }
            Err(e) => {
                warn!("Cache entry {} has an unexpected shape: {}", key, e);
                self.stats.record_miss();
                None
            }
        }
    }

    // == Set ==
    /// Stores `value` under `key` for `ttl_ms` (default TTL when None).
    ///
    /// Overwrites reset the timestamp and TTL. Returns whether the entry
    /// reached the backing store; a failed write leaves stats untouched.
    pub fn set<T: Serialize + ?Sized>(&mut self, key: &str, value: &T, ttl_ms: Option<u64>) -> bool {
        let value = match serde_json::to_value(value) {
            Ok(value) => value,
            Err(e) => {
                warn!("Cache set failed for {}: {}", key, e);
                return false;
            }
        };

        let entry = CacheEntry::new(
            key,
            value,
            self.clock.now_ms(),
            ttl_ms.unwrap_or(self.default_ttl_ms),
        );

        let stored = serde_json::to_string(&entry)
            .map_err(StoreError::from)
            .and_then(|encoded| self.backend.write(&self.raw_key(key), &encoded));

        match stored {
            Ok(()) => {
                self.stats.record_insert();
                true
            }
            Err(e) => {
                warn!("Cache set failed for {}: {}", key, e);
                false
            }
        }
    }

    // == Remove ==
    /// Deletes `key`; absent keys still decrement the size counter.
    pub fn remove(&mut self, key: &str) {
        match self.backend.delete(&self.raw_key(key)) {
            Ok(()) => self.stats.record_removal(),
            Err(e) => warn!("Cache remove failed for {}: {}", key, e),
        }
    }

    // == Clear ==
    /// Deletes every key in this cache's namespace and resets statistics.
    ///
    /// Keys outside the namespace are never touched. Statistics are local
    /// state and are reset even when the store can't be enumerated.
    pub fn clear(&mut self) {
        match self.backend.list_keys() {
            Ok(keys) => {
                let mut removed = 0usize;
                for raw_key in keys.iter().filter(|k| k.starts_with(&self.namespace)) {
                    match self.backend.delete(raw_key) {
                        Ok(()) => removed += 1,
                        Err(e) => warn!("Cache clear could not delete {}: {}", raw_key, e),
                    }
                }
                debug!("Cache {} cleared {} entries", self.namespace, removed);
            }
            Err(e) => warn!("Cache clear could not list keys: {}", e),
        }
        self.stats.reset();
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    // == Get Or Fetch ==
    /// Read-through lookup: returns the live value for `key`, otherwise
    /// awaits `fetch`, caches its result for `ttl_ms` and returns it.
    ///
    /// Errors from `fetch` are returned untouched and nothing is cached.
    pub async fn get_or_fetch<T, E, F, Fut>(
        &mut self,
        key: &str,
        ttl_ms: Option<u64>,
        fetch: F,
    ) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Some(hit) = self.get(key) {
            return Ok(hit);
        }

        let fresh = fetch().await?;
        self.set(key, &fresh, ttl_ms);
        Ok(fresh)
    }

    fn evict(&mut self, raw_key: &str) {
        match self.backend.delete(raw_key) {
            Ok(()) => self.stats.record_removal(),
            Err(e) => warn!("Cache eviction failed for {}: {}", raw_key, e),
        }
    }
}

impl std::fmt::Debug for KeyedTtlCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyedTtlCache")
            .field("namespace", &self.namespace)
            .field("default_ttl_ms", &self.default_ttl_ms)
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}
