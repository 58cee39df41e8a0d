//! Feed Module
//!
//! The consuming view of the cache and loader: pages posts in from a
//! source, caching every page under `posts:s{size}:p{n}`.

mod pager;
mod source;

pub use pager::{page_key, FeedFilter, FeedPager};
pub use source::{InMemoryPostSource, PostSource};
