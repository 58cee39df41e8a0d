//! Incremental Load Controller Module
//!
//! Runs a caller-supplied "fetch more" operation whenever a bound sentinel
//! scrolls into view, with at most one fetch in flight.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error};

use super::visibility::{ObserveOptions, SentinelId, Subscription, SubscriptionId, VisibilityObserver};

/// Boxed future returned by a fetch-more operation.
pub type FetchFuture = Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send>>;

type FetchMoreFn = Arc<dyn Fn() -> FetchFuture + Send + Sync>;

const FAILURE_CHANNEL_CAPACITY: usize = 16;

/// Report of a fetch-more call that failed or panicked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchFailure {
    pub message: String,
}

// == Shared State ==
/// State reached from the loader, its watcher task and in-flight fetches.
struct Shared {
    fetch_more: FetchMoreFn,
    /// In-flight flag; also the observable exposed to callers
    fetching: watch::Sender<bool>,
    has_more: AtomicBool,
    failures: broadcast::Sender<FetchFailure>,
}

impl Shared {
    fn is_fetching(&self) -> bool {
        *self.fetching.borrow()
    }

    /// Atomically flips the in-flight flag from false to true.
    fn try_begin(&self) -> bool {
        self.fetching.send_if_modified(|fetching| {
            if *fetching {
                false
            } else {
                *fetching = true;
                true
            }
        })
    }

    /// Starts a fetch unless one is running or there is nothing left.
    ///
    /// The flag is set before `fetch_more` is called; the guard clears it
    /// however the fetch ends.
    fn trigger(self: &Arc<Self>) -> bool {
        if !self.has_more.load(Ordering::SeqCst) {
            return false;
        }
        if !self.try_begin() {
            debug!("Fetch already in flight, visibility signal coalesced");
            return false;
        }

        let guard = InFlightGuard {
            shared: Arc::clone(self),
        };
        let fetch = (self.fetch_more)();

        tokio::spawn(async move {
            let guard = guard;
            if let Err(err) = fetch.await {
                guard.shared.report(format!("{:#}", err));
            }
        });
        true
    }

    fn report(&self, message: String) {
        error!("Error fetching more data: {}", message);
        // No subscribers is fine.
        let _ = self.failures.send(FetchFailure { message });
    }
}

/// Clears the in-flight flag when a fetch settles, unwinding included.
struct InFlightGuard {
    shared: Arc<Shared>,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        if std::thread::panicking() {
            self.shared.report("fetch panicked".to_string());
        }
        self.shared.fetching.send_replace(false);
    }
}

// == Binding ==
/// One sentinel observation owned by a watcher task.
struct Binding {
    task: JoinHandle<()>,
    state: Arc<BindingState>,
}

#[derive(Default)]
struct BindingState {
    active: AtomicBool,
    subscription: Mutex<Option<SubscriptionId>>,
}

impl BindingState {
    fn track(&self, id: Option<SubscriptionId>) {
        if let Ok(mut slot) = self.subscription.lock() {
            *slot = id;
        }
    }
}

// == Incremental Loader ==
/// Viewport-driven trigger for incremental loading.
///
/// Bind a sentinel placed after the last rendered item; while `has_more` is
/// true the loader observes it and calls `fetch_more` each time it becomes
/// visible and no fetch is running. Visibility signals arriving during a
/// fetch are dropped, not queued. Once a fetch settles the observation is
/// renewed, so a sentinel that is still in view pulls the next page right
/// away, or retries after a failure. A failure only clears the in-flight
/// flag and is reported on [`IncrementalLoader::subscribe_failures`].
///
/// Binding spawns a Tokio task and must happen inside a runtime.
pub struct IncrementalLoader {
    shared: Arc<Shared>,
    observer: Arc<dyn VisibilityObserver>,
    options: ObserveOptions,
    sentinel: Option<SentinelId>,
    binding: Option<Binding>,
}

impl IncrementalLoader {
    // == Constructor ==
    /// Creates a loader; nothing is observed until a sentinel is bound.
    pub fn new<F, Fut>(
        fetch_more: F,
        observer: Arc<dyn VisibilityObserver>,
        has_more: bool,
        options: ObserveOptions,
    ) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        let fetch_more: FetchMoreFn = Arc::new(move || Box::pin(fetch_more()) as FetchFuture);
        let (fetching, _) = watch::channel(false);
        let (failures, _) = broadcast::channel(FAILURE_CHANNEL_CAPACITY);

        Self {
            shared: Arc::new(Shared {
                fetch_more,
                fetching,
                has_more: AtomicBool::new(has_more),
                failures,
            }),
            observer,
            options,
            sentinel: None,
            binding: None,
        }
    }

    // == Bind ==
    /// Binds `sentinel` (or nothing), releasing any previous observation.
    pub fn bind(&mut self, sentinel: Option<SentinelId>) {
        self.sentinel = sentinel;
        self.sync();
    }

    /// Stops observing; no fetch is triggered afterwards.
    pub fn unbind(&mut self) {
        self.bind(None);
    }

    pub fn sentinel(&self) -> Option<SentinelId> {
        self.sentinel
    }

    // == Has More ==
    /// Updates the "more data available" flag, observing only while true.
    pub fn set_has_more(&mut self, has_more: bool) {
        let previous = self.shared.has_more.swap(has_more, Ordering::SeqCst);
        if previous != has_more {
            self.sync();
        }
    }

    pub fn has_more(&self) -> bool {
        self.shared.has_more.load(Ordering::SeqCst)
    }

    // == Fetch State ==
    pub fn is_fetching(&self) -> bool {
        self.shared.is_fetching()
    }

    /// Receiver tracking the in-flight flag.
    pub fn subscribe_fetching(&self) -> watch::Receiver<bool> {
        self.shared.fetching.subscribe()
    }

    /// Receiver of failure reports from fetch-more calls.
    pub fn subscribe_failures(&self) -> broadcast::Receiver<FetchFailure> {
        self.shared.failures.subscribe()
    }

    /// Resolves once no fetch is in flight.
    pub async fn wait_idle(&self) {
        let mut fetching = self.shared.fetching.subscribe();
        let _ = fetching.wait_for(|busy| !*busy).await;
    }

    /// Whether a sentinel observation is currently held.
    pub fn is_observing(&self) -> bool {
        self.binding.is_some()
    }

    fn sync(&mut self) {
        self.detach();

        let Some(sentinel) = self.sentinel else {
            return;
        };
        if !self.has_more() {
            debug!("Sentinel {:?} bound but nothing left to load", sentinel);
            return;
        }

        let state = Arc::new(BindingState {
            active: AtomicBool::new(true),
            ..BindingState::default()
        });
        let task = tokio::spawn(watch_sentinel(
            Arc::clone(&self.shared),
            Arc::clone(&self.observer),
            sentinel,
            self.options,
            Arc::clone(&state),
        ));
        debug!("Observing sentinel {:?}", sentinel);
        self.binding = Some(Binding { task, state });
    }

    fn detach(&mut self) {
        let Some(binding) = self.binding.take() else {
            return;
        };
        binding.state.active.store(false, Ordering::SeqCst);
        binding.task.abort();

        // Release right away instead of waiting for the aborted task to drop.
        let current = binding
            .state
            .subscription
            .lock()
            .ok()
            .and_then(|mut slot| slot.take());
        if let Some(id) = current {
            self.observer.unobserve(id);
        }
    }
}

impl Drop for IncrementalLoader {
    fn drop(&mut self) {
        self.detach();
    }
}

/// Watcher task: observe, trigger on visibility, sit out the fetch, repeat.
async fn watch_sentinel(
    shared: Arc<Shared>,
    observer: Arc<dyn VisibilityObserver>,
    sentinel: SentinelId,
    options: ObserveOptions,
    binding: Arc<BindingState>,
) {
    let mut fetching = shared.fetching.subscribe();

    loop {
        let mut subscription = Subscription::open(Arc::clone(&observer), sentinel, options);
        binding.track(Some(subscription.id()));

        loop {
            let Some(change) = subscription.next().await else {
                binding.track(None);
                return;
            };
            if !binding.active.load(Ordering::SeqCst) {
                return;
            }
            if !change.is_intersecting {
                continue;
            }
            if shared.trigger() || shared.is_fetching() {
                break;
            }
        }

        drop(subscription);
        binding.track(None);

        let settled = fetching.wait_for(|busy| !*busy).await.is_ok();
        if !settled {
            return;
        }
    }
}
