//! Post Models Module
//!
//! Post models rendered by the feed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Characters kept when an excerpt is derived from the content
pub const EXCERPT_LENGTH: usize = 200;

/// Average reading speed used for reading time estimates
pub const WORDS_PER_MINUTE: usize = 225;

/// Kind of post, which decides how a card is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostKind {
    Text,
    Photo,
    Quote,
    Link,
    Video,
    Audio,
}

/// A post as shown in the feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostSummary {
    pub id: String,
    pub title: String,
    pub content: String,
    pub excerpt: String,
    pub kind: PostKind,
    pub author: String,
    pub published_at: DateTime<Utc>,
    pub category: String,
    pub tags: Vec<String>,
    #[serde(default)]
    pub likes: u64,
    #[serde(default)]
    pub views: u64,
}

impl PostSummary {
    /// Builds a post whose excerpt is derived from `content`.
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        content: impl Into<String>,
        kind: PostKind,
        author: impl Into<String>,
        published_at: DateTime<Utc>,
    ) -> Self {
        let content = content.into();
        Self {
            id: id.into(),
            title: title.into(),
            excerpt: Self::excerpt_from(&content),
            content,
            kind,
            author: author.into(),
            published_at,
            category: "Uncategorized".to_string(),
            tags: Vec::new(),
            likes: 0,
            views: 0,
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn with_tags<I, T>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// First [`EXCERPT_LENGTH`] characters of `content` followed by "...".
    pub fn excerpt_from(content: &str) -> String {
        let head: String = content.chars().take(EXCERPT_LENGTH).collect();
        format!("{}...", head)
    }

    /// Estimated minutes to read the content, markup ignored, at least 1.
    pub fn reading_time_minutes(&self) -> usize {
        let words = strip_tags(&self.content).split_whitespace().count();
        words.div_ceil(WORDS_PER_MINUTE).max(1)
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

fn strip_tags(html: &str) -> String {
    let mut text = String::with_capacity(html.len());
    let mut in_tag = false;
    for c in html.chars() {
        match c {
            '<' => in_tag = true,
            // Keep words on either side of a tag apart.
            '>' if in_tag => {
                in_tag = false;
                text.push(' ');
            }
            _ if !in_tag => text.push(c),
            _ => {}
        }
    }
    text
}

/// One page of posts as returned by a post source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostPage {
    /// 1-based page number
    pub page: usize,
    pub posts: Vec<PostSummary>,
    /// Whether the source holds posts after this page
    pub has_more: bool,
}
