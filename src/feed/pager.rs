//! Feed Pager Module
//!
//! Page-at-a-time post loading through the TTL cache.

use std::collections::BTreeMap;

use tracing::{debug, info};

use super::source::PostSource;
use crate::cache::{CacheStats, KeyedTtlCache};
use crate::error::Result;
use crate::models::{PostPage, PostSummary};

/// Client-side filter over loaded posts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedFilter {
    pub category: Option<String>,
    pub tag: Option<String>,
}

impl FeedFilter {
    pub fn matches(&self, post: &PostSummary) -> bool {
        self.category.as_deref().map_or(true, |c| post.category == c)
            && self.tag.as_deref().map_or(true, |t| post.has_tag(t))
    }

    pub fn is_empty(&self) -> bool {
        self.category.is_none() && self.tag.is_none()
    }
}

/// Cache key of a feed page.
///
/// Pages of different sizes hold different posts, so the size is part of
/// the key.
pub fn page_key(page: usize, page_size: usize) -> String {
    format!("posts:s{}:p{}", page_size, page)
}

// == Feed Pager ==
/// Loads feed pages in order, consulting the cache before the source.
pub struct FeedPager<S: PostSource> {
    source: S,
    cache: KeyedTtlCache,
    page_size: usize,
    /// TTL for cached pages; None uses the cache default
    page_ttl_ms: Option<u64>,
    next_page: usize,
    posts: Vec<PostSummary>,
    has_more: bool,
}

impl<S: PostSource> FeedPager<S> {
    pub fn new(source: S, cache: KeyedTtlCache, page_size: usize) -> Self {
        Self {
            source,
            cache,
            page_size: page_size.max(1),
            page_ttl_ms: None,
            next_page: 1,
            posts: Vec::new(),
            has_more: true,
        }
    }

    pub fn with_page_ttl(mut self, ttl_ms: u64) -> Self {
        self.page_ttl_ms = Some(ttl_ms);
        self
    }

    // == Load Next ==
    /// Loads the next page, from cache when live, and appends its posts.
    ///
    /// Returns the number of posts added. An empty page or one flagged as
    /// the last ends the feed. Source errors leave the pager unchanged so
    /// the same page is retried next time.
    pub async fn load_next(&mut self) -> Result<usize> {
        if !self.has_more {
            return Ok(0);
        }

        let page = self.next_page;
        let page_size = self.page_size;
        let source = &self.source;
        let loaded: PostPage = self
            .cache
            .get_or_fetch(&page_key(page, page_size), self.page_ttl_ms, || source.fetch_page(page, page_size))
            .await?;

        let added = loaded.posts.len();
        self.posts.extend(loaded.posts);
        self.next_page += 1;
        self.has_more = loaded.has_more && added > 0;

        debug!("Loaded page {} with {} posts, has_more={}", page, added, self.has_more);
        Ok(added)
    }

    // == Refresh ==
    /// Drops loaded posts and their cached pages so the feed reloads fresh.
    pub fn refresh(&mut self) {
        for page in 1..self.next_page {
            self.cache.remove(&page_key(page, self.page_size));
        }
        info!("Feed refreshed after {} pages", self.next_page - 1);
        self.posts.clear();
        self.next_page = 1;
        self.has_more = true;
    }

    pub fn posts(&self) -> &[PostSummary] {
        &self.posts
    }

    pub fn has_more(&self) -> bool {
        self.has_more
    }

    /// Next page number to be loaded.
    pub fn next_page(&self) -> usize {
        self.next_page
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn cache_mut(&mut self) -> &mut KeyedTtlCache {
        &mut self.cache
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Loaded posts passing `filter`, in feed order.
    pub fn visible_posts(&self, filter: &FeedFilter) -> Vec<&PostSummary> {
        self.posts.iter().filter(|p| filter.matches(p)).collect()
    }

    /// Categories of loaded posts with post counts, sorted by name.
    pub fn categories(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for post in &self.posts {
            *counts.entry(post.category.clone()).or_insert(0) += 1;
        }
        counts
    }

    /// Tags of loaded posts with post counts, sorted by name.
    pub fn tags(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for tag in self.posts.iter().flat_map(|p| p.tags.iter()) {
            *counts.entry(tag.clone()).or_insert(0) += 1;
        }
        counts
    }
}
