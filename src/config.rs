//! Configuration Module
//!
//! Handles loading cache, loader and feed settings from environment variables.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use crate::cache::{DEFAULT_NAMESPACE, DEFAULT_TTL_MS};
use crate::loader::ObserveOptions;

/// Runtime configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Key prefix that partitions this cache inside the backing store
    pub namespace: String,
    /// Default TTL in milliseconds for entries stored without an explicit TTL
    pub default_ttl_ms: u64,
    /// Path of the JSON file backing the durable store
    pub store_path: PathBuf,
    /// Fraction of the sentinel that must be visible to trigger a load
    pub threshold: f64,
    /// Look-ahead margin in pixels added around the viewport
    pub root_margin: f64,
    /// Number of posts requested per page
    pub page_size: usize,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_NAMESPACE` - Backing store key prefix (default: "feedcache:")
    /// - `CACHE_DEFAULT_TTL_MS` - Default TTL in milliseconds (default: 300000)
    /// - `CACHE_STORE_PATH` - Store file (default: "feed_cache_store.json")
    /// - `LOADER_THRESHOLD` - Visibility threshold in 0..=1 (default: 1.0)
    /// - `LOADER_ROOT_MARGIN` - Look-ahead margin in px (default: 20)
    /// - `FEED_PAGE_SIZE` - Posts per page (default: 2)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            namespace: env::var("CACHE_NAMESPACE")
                .ok()
                .filter(|v| !v.is_empty())
                .unwrap_or(defaults.namespace),
            default_ttl_ms: parse_var("CACHE_DEFAULT_TTL_MS").unwrap_or(defaults.default_ttl_ms),
            store_path: env::var("CACHE_STORE_PATH")
                .ok()
                .map(PathBuf::from)
                .unwrap_or(defaults.store_path),
            threshold: parse_var::<f64>("LOADER_THRESHOLD")
                .filter(|t| (0.0..=1.0).contains(t))
                .unwrap_or(defaults.threshold),
            root_margin: parse_var("LOADER_ROOT_MARGIN").unwrap_or(defaults.root_margin),
            page_size: parse_var::<usize>("FEED_PAGE_SIZE")
                .filter(|n| *n > 0)
                .unwrap_or(defaults.page_size),
        }
    }

    /// Visibility options for the incremental loader.
    pub fn observe_options(&self) -> ObserveOptions {
        ObserveOptions {
            threshold: self.threshold,
            root_margin: self.root_margin,
        }
    }
}

fn parse_var<T: FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.trim().parse().ok())
}

impl Default for Config {
    fn default() -> Self {
        let options = ObserveOptions::default();
        Self {
            namespace: DEFAULT_NAMESPACE.to_string(),
            default_ttl_ms: DEFAULT_TTL_MS,
            store_path: PathBuf::from("feed_cache_store.json"),
            threshold: options.threshold,
            root_margin: options.root_margin,
            page_size: 2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.namespace, "feedcache:");
        assert_eq!(config.default_ttl_ms, 300_000);
        assert_eq!(config.store_path, PathBuf::from("feed_cache_store.json"));
        assert_eq!(config.threshold, 1.0);
        assert_eq!(config.root_margin, 20.0);
        assert_eq!(config.page_size, 2);
    }

    // Single test touching the environment so parallel tests don't race.
    #[test]
    fn test_config_from_env() {
        for name in [
            "CACHE_NAMESPACE",
            "CACHE_DEFAULT_TTL_MS",
            "CACHE_STORE_PATH",
            "LOADER_THRESHOLD",
            "LOADER_ROOT_MARGIN",
            "FEED_PAGE_SIZE",
        ] {
            env::remove_var(name);
        }

        let config = Config::from_env();
        assert_eq!(config.namespace, "feedcache:");
        assert_eq!(config.default_ttl_ms, 300_000);
        assert_eq!(config.page_size, 2);

        env::set_var("CACHE_DEFAULT_TTL_MS", "60000");
        env::set_var("LOADER_THRESHOLD", "1.5");
        env::set_var("FEED_PAGE_SIZE", "not-a-number");
        env::set_var("CACHE_NAMESPACE", "blog:");

        let config = Config::from_env();
        assert_eq!(config.default_ttl_ms, 60_000);
        assert_eq!(config.threshold, 1.0, "out of range threshold falls back");
        assert_eq!(config.page_size, 2, "unparseable page size falls back");
        assert_eq!(config.namespace, "blog:");
        assert_eq!(config.observe_options().root_margin, 20.0);

        env::remove_var("CACHE_DEFAULT_TTL_MS");
        env::remove_var("LOADER_THRESHOLD");
        env::remove_var("FEED_PAGE_SIZE");
        env::remove_var("CACHE_NAMESPACE");
    }
}
