//! Error Module
//!
//! Error types for the feed cache, using thiserror.

use thiserror::Error;

// == Store Error Enum ==
/// Failure raised by a backing store operation.
///
/// The cache never lets one of these escape its public API; they are logged
/// and converted into a miss or a no-op.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Reading or writing the underlying file failed
    #[error("Store I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// Stored data could not be encoded or decoded
    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Writing would exceed the store's byte quota
    #[error("Quota exceeded: {used} of {quota} bytes in use")]
    QuotaExceeded { used: usize, quota: usize },

    /// Store cannot be reached at all
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

// == Feed Error Enum ==
/// Errors surfaced by the feed layer to the consuming view.
#[derive(Error, Debug)]
pub enum FeedError {
    /// The post source rejected a page request
    #[error("Post source failed: {0}")]
    Source(String),

    /// The backing store could not be opened
    #[error(transparent)]
    Store(#[from] StoreError),
}

// == Result Type Aliases ==
/// Convenience Result type for backing store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Convenience Result type for feed operations.
pub type Result<T> = std::result::Result<T, FeedError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quota_message_names_both_sizes() {
        let err = StoreError::QuotaExceeded {
            used: 120,
            quota: 100,
        };
        assert_eq!(err.to_string(), "Quota exceeded: 120 of 100 bytes in use");
    }

    #[test]
    fn test_store_error_converts_into_feed_error() {
        let err: FeedError = StoreError::Unavailable("disk gone".to_string()).into();
        assert!(matches!(err, FeedError::Store(StoreError::Unavailable(_))));
        assert_eq!(err.to_string(), "Store unavailable: disk gone");
    }

    #[test]
    fn test_serde_error_converts() {
        let parse = serde_json::from_str::<serde_json::Value>("{not json");
        let err: StoreError = parse.unwrap_err().into();
        assert!(matches!(err, StoreError::Serialization(_)));
    }
}
