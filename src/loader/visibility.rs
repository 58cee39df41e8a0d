//! Visibility Module
//!
//! Visibility primitive consumed by the incremental loader.
//!
//! Observation is a message-passing subscription: `observe` hands back a
//! channel of intersection changes for one sentinel and `unobserve` closes
//! it. [`Subscription`] ties the two together so that dropping it releases
//! the watch.

use std::sync::Arc;

use tokio::sync::mpsc;

/// Handle of a sentinel element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SentinelId(pub u64);

/// Identifier of one observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u64);

/// When a sentinel counts as visible.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObserveOptions {
    /// Fraction of the sentinel's area that must be inside the root, 0..=1
    pub threshold: f64,
    /// Pixels added around the root on every side (look-ahead)
    pub root_margin: f64,
}

impl Default for ObserveOptions {
    fn default() -> Self {
        Self {
            threshold: 1.0,
            root_margin: 20.0,
        }
    }
}

/// Intersection state of a sentinel after a change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisibilityChange {
    pub sentinel: SentinelId,
    pub is_intersecting: bool,
}

/// Host-provided viewport observer.
///
/// Implementations deliver the current state once when observation starts
/// (if the sentinel is known) and then one message per state change.
pub trait VisibilityObserver: Send + Sync {
    fn observe(
        &self,
        sentinel: SentinelId,
        options: ObserveOptions,
    ) -> (SubscriptionId, mpsc::UnboundedReceiver<VisibilityChange>);

    /// Stops delivery for `id`. Unknown ids are ignored.
    fn unobserve(&self, id: SubscriptionId);
}

/// Active observation, released on drop.
pub struct Subscription {
    id: SubscriptionId,
    events: mpsc::UnboundedReceiver<VisibilityChange>,
    observer: Arc<dyn VisibilityObserver>,
}

impl Subscription {
    pub fn open(
        observer: Arc<dyn VisibilityObserver>,
        sentinel: SentinelId,
        options: ObserveOptions,
    ) -> Self {
        let (id, events) = observer.observe(sentinel, options);
        Self {
            id,
            events,
            observer,
        }
    }

    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Next change, or None once the observer stopped delivering.
    pub async fn next(&mut self) -> Option<VisibilityChange> {
        self.events.recv().await
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.observer.unobserve(self.id);
    }
}
