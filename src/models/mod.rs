//! Models Module
//!
//! Data models for the post feed. Posts and pages are what the feed
//! caches, so they serialize to JSON.

pub mod post;

// Re-export commonly used types
pub use post::{PostKind, PostPage, PostSummary};
