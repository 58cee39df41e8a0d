//! Post Source Module
//!
//! Post sources the feed pages through.

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use chrono::{Duration as ChronoDuration, TimeZone, Utc};
use tracing::debug;

use crate::error::{FeedError, Result};
use crate::models::{PostKind, PostPage, PostSummary};

/// Remote post storage, queried one page at a time.
pub trait PostSource: Send + Sync {
    /// Fetches 1-based `page` holding up to `page_size` posts, newest first.
    fn fetch_page(&self, page: usize, page_size: usize) -> impl Future<Output = Result<PostPage>> + Send;
}

/// Post source over a fixed list, with optional latency and injected failures.
#[derive(Debug, Default)]
pub struct InMemoryPostSource {
    posts: Vec<PostSummary>,
    latency: Duration,
    pending_failures: AtomicUsize,
    requests: AtomicUsize,
}

impl InMemoryPostSource {
    pub fn new(posts: Vec<PostSummary>) -> Self {
        Self {
            posts,
            ..Self::default()
        }
    }

    /// Source holding `count` generated posts, newest first.
    pub fn seeded(count: usize) -> Self {
        Self::new(sample_posts(count))
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Makes the next `count` requests fail.
    pub fn fail_next(&self, count: usize) {
        self.pending_failures.store(count, Ordering::SeqCst);
    }

    /// Requests received so far, failed ones included.
    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    pub fn len(&self) -> usize {
        self.posts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }

    fn take_failure(&self) -> bool {
        self.pending_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

impl PostSource for InMemoryPostSource {
    async fn fetch_page(&self, page: usize, page_size: usize) -> Result<PostPage> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        if self.take_failure() {
            return Err(FeedError::Source(format!("page {} unavailable", page)));
        }
        if page == 0 || page_size == 0 {
            return Err(FeedError::Source(format!(
                "invalid page request: page {} of size {}",
                page, page_size
            )));
        }

        let start = ((page - 1) * page_size).min(self.posts.len());
        let end = (start + page_size).min(self.posts.len());
        debug!("Serving posts {}..{} for page {}", start, end, page);

        Ok(PostPage {
            page,
            posts: self.posts[start..end].to_vec(),
            has_more: end < self.posts.len(),
        })
    }
}

const SAMPLE_TOPICS: &[(&str, PostKind, &str, &[&str])] = &[
    ("Notes on lazy expiry", PostKind::Text, "Engineering", &["caching", "design"]),
    ("Harbor at dawn", PostKind::Photo, "Photography", &["photography", "travel"]),
    ("On small tools", PostKind::Quote, "Philosophy", &["quotes", "craft"]),
    ("A reading list for storage engines", PostKind::Link, "Engineering", &["databases", "reading"]),
    ("Profiling a feed page", PostKind::Video, "Engineering", &["performance", "webdev"]),
    ("Field recording: rain", PostKind::Audio, "Music", &["audio", "nature"]),
];

const SAMPLE_AUTHORS: &[&str] = &["Mara Lind", "Tomás Reyes", "June Okafor"];

fn sample_posts(count: usize) -> Vec<PostSummary> {
    let newest = Utc
        .with_ymd_and_hms(2024, 1, 20, 9, 0, 0)
        .single()
        .unwrap_or_else(Utc::now);

    (0..count)
        .map(|i| {
            let (title, kind, category, tags) = SAMPLE_TOPICS[i % SAMPLE_TOPICS.len()];
            let body = format!(
                "Entry {} in the series. {}",
                i + 1,
                "Short paragraphs about building and running a small blog. ".repeat(4 + i % 5)
            );
            PostSummary::new(
                format!("post-{}", i + 1),
                format!("{} #{}", title, i + 1),
                body,
                kind,
                SAMPLE_AUTHORS[i % SAMPLE_AUTHORS.len()],
                newest - ChronoDuration::hours(7 * i as i64),
            )
            .with_category(category)
            .with_tags(tags.iter().copied())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_pages_through_posts() {
        let source = InMemoryPostSource::seeded(5);

        let first = source.fetch_page(1, 2).await.unwrap();
        assert_eq!(first.posts.len(), 2);
        assert_eq!(first.posts[0].id, "post-1");
        assert!(first.has_more);

        let last = source.fetch_page(3, 2).await.unwrap();
        assert_eq!(last.posts.len(), 1);
        assert!(!last.has_more);

        let past_end = source.fetch_page(4, 2).await.unwrap();
        assert!(past_end.posts.is_empty());
        assert!(!past_end.has_more);
        assert_eq!(source.request_count(), 3);
    }

    #[tokio::test]
    async fn test_injected_failures() {
        let source = InMemoryPostSource::seeded(3);
        source.fail_next(2);

        assert!(matches!(source.fetch_page(1, 2).await, Err(FeedError::Source(_))));
        assert!(source.fetch_page(1, 2).await.is_err());
        assert!(source.fetch_page(1, 2).await.is_ok());
    }

    #[tokio::test]
    async fn test_rejects_page_zero() {
        let source = InMemoryPostSource::seeded(3);
        assert!(source.fetch_page(0, 2).await.is_err());
    }

    #[test]
    fn test_seeded_posts_are_newest_first() {
        let posts = sample_posts(8);
        assert_eq!(posts.len(), 8);
        assert!(posts.windows(2).all(|w| w[0].published_at > w[1].published_at));
        assert_eq!(posts[6].category, posts[0].category);
    }
}
