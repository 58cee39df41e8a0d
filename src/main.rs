//! Feed Cache Demo
//!
//! Scrolls a simulated post feed to the end. Pages are loaded by the
//! incremental loader when the sentinel under the last post comes into view
//! and are cached in a file-backed store, so a second run within the TTL
//! serves every page from cache.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use feed_cache::feed::{FeedFilter, FeedPager, InMemoryPostSource};
use feed_cache::loader::{Bounds, IncrementalLoader, SentinelId, Viewport};
use feed_cache::{Config, FileStore, KeyedTtlCache};

const VIEWPORT_HEIGHT: f64 = 600.0;
const POST_HEIGHT: f64 = 200.0;
const SEED_POSTS: usize = 11;
const SOURCE_LATENCY: Duration = Duration::from_millis(150);
const SENTINEL: SentinelId = SentinelId(1);
/// Rounds without new posts before the demo gives up
const MAX_STALLS: usize = 3;

/// Main entry point for the feed demo.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Open the file store and build the cache and pager
/// 4. Render the first page and bind the loader to the sentinel
/// 5. Scroll to the bottom until the feed is exhausted
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "feed_cache=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();
    info!(
        "Configuration loaded: namespace={}, default_ttl={}ms, store={}, page_size={}",
        config.namespace,
        config.default_ttl_ms,
        config.store_path.display(),
        config.page_size
    );

    let store = Arc::new(FileStore::open(config.store_path.clone())?);
    let cache = KeyedTtlCache::from_config(store, &config);
    let source = InMemoryPostSource::seeded(SEED_POSTS).with_latency(SOURCE_LATENCY);
    let pager = Arc::new(Mutex::new(FeedPager::new(source, cache, config.page_size)));

    // First render happens before any scrolling.
    let has_more = {
        let mut pager = pager.lock().await;
        pager.load_next().await?;
        pager.has_more()
    };

    let viewport = Arc::new(Viewport::new(VIEWPORT_HEIGHT));
    let fetch_pager = Arc::clone(&pager);
    let fetch_viewport = Arc::clone(&viewport);
    let mut loader = IncrementalLoader::new(
        move || {
            let pager = Arc::clone(&fetch_pager);
            let viewport = Arc::clone(&fetch_viewport);
            async move {
                let mut pager = pager.lock().await;
                let added = pager.load_next().await?;
                // New posts push the sentinel down, like a re-render would.
                place_sentinel(&viewport, pager.posts().len());
                info!("Loaded {} more posts", added);
                Ok::<(), anyhow::Error>(())
            }
        },
        viewport.clone(),
        has_more,
        config.observe_options(),
    );

    let mut rendered = pager.lock().await.posts().len();
    place_sentinel(&viewport, rendered);
    loader.bind(Some(SENTINEL));

    let mut stalls = 0;
    while loader.has_more() && stalls < MAX_STALLS {
        let bottom = (rendered as f64 * POST_HEIGHT - VIEWPORT_HEIGHT).max(0.0);
        viewport.scroll_to(bottom);

        // Give the watcher a turn, then let the fetch settle.
        tokio::time::sleep(Duration::from_millis(20)).await;
        loader.wait_idle().await;

        let (now_rendered, has_more) = {
            let pager = pager.lock().await;
            (pager.posts().len(), pager.has_more())
        };
        if now_rendered == rendered {
            stalls += 1;
            // Scrolling away pauses retries against a failing source.
            viewport.scroll_to(0.0);
        } else {
            stalls = 0;
        }
        rendered = now_rendered;
        loader.set_has_more(has_more);
    }
    loader.unbind();

    if stalls >= MAX_STALLS {
        warn!("Feed stopped making progress after {} posts", rendered);
    }

    let pager = pager.lock().await;
    for post in pager.visible_posts(&FeedFilter::default()) {
        info!(
            "{} | {} | {} | {} min read",
            post.published_at.format("%Y-%m-%d"),
            post.category,
            post.title,
            post.reading_time_minutes()
        );
    }

    info!("Categories: {:?}", pager.categories());
    info!("Tags: {:?}", pager.tags());

    let stats = pager.cache_stats();
    info!(
        "Cache stats: hits={}, misses={}, size={}, hit_rate={:.2}, source requests={}",
        stats.hits,
        stats.misses,
        stats.size,
        stats.hit_rate(),
        pager.source().request_count()
    );

    Ok(())
}

/// Moves the sentinel under the last of `rendered` posts.
fn place_sentinel(viewport: &Viewport, rendered: usize) {
    viewport.place(SENTINEL, Bounds::new(rendered as f64 * POST_HEIGHT, 1.0));
}
