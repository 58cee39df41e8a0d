//! Viewport Module
//!
//! In-process viewport implementing [`VisibilityObserver`].
//!
//! Models a vertically scrolling root of fixed height with sentinels placed
//! at absolute offsets. Intersection follows IntersectionObserver rules: the
//! root is grown by `root_margin` on each side and a sentinel intersects
//! once the visible fraction of its height reaches `threshold`.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use tokio::sync::mpsc;
use tracing::trace;

use super::visibility::{
    ObserveOptions, SentinelId, SubscriptionId, VisibilityChange, VisibilityObserver,
};

// Float slack so a fully visible element reads as ratio 1.0.
const RATIO_EPSILON: f64 = 1e-9;

/// Vertical placement of an element, in content pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub top: f64,
    pub height: f64,
}

impl Bounds {
    pub fn new(top: f64, height: f64) -> Self {
        Self {
            top,
            height: height.max(0.0),
        }
    }
}

struct Watch {
    sentinel: SentinelId,
    options: ObserveOptions,
    tx: mpsc::UnboundedSender<VisibilityChange>,
    last: Option<bool>,
}

#[derive(Default)]
struct ViewportState {
    height: f64,
    scroll_top: f64,
    elements: HashMap<SentinelId, Bounds>,
    watches: HashMap<SubscriptionId, Watch>,
    next_id: u64,
}

impl ViewportState {
    fn intersects(&self, bounds: Bounds, options: &ObserveOptions) -> bool {
        let root_top = self.scroll_top - options.root_margin;
        let root_bottom = self.scroll_top + self.height + options.root_margin;
        let bottom = bounds.top + bounds.height;

        if bounds.height == 0.0 {
            return bounds.top >= root_top && bounds.top <= root_bottom;
        }

        let overlap = bottom.min(root_bottom) - bounds.top.max(root_top);
        if overlap <= 0.0 {
            return false;
        }
        overlap / bounds.height + RATIO_EPSILON >= options.threshold
    }

    fn current(&self, watch: &Watch) -> Option<bool> {
        self.elements
            .get(&watch.sentinel)
            .map(|bounds| self.intersects(*bounds, &watch.options))
    }

    /// Sends every changed state and drops watches whose receiver is gone.
    fn notify(&mut self) {
        let updates: Vec<(SubscriptionId, bool)> = self
            .watches
            .iter()
            .filter_map(|(id, watch)| match self.current(watch) {
                Some(now) if watch.last != Some(now) => Some((*id, now)),
                _ => None,
            })
            .collect();

        for (id, is_intersecting) in updates {
            let Some(watch) = self.watches.get_mut(&id) else {
                continue;
            };
            watch.last = Some(is_intersecting);
            let change = VisibilityChange {
                sentinel: watch.sentinel,
                is_intersecting,
            };
            trace!("Viewport change {:?}", change);
            if watch.tx.send(change).is_err() {
                self.watches.remove(&id);
            }
        }
    }
}

/// Scrollable viewport of a fixed height.
pub struct Viewport {
    state: Mutex<ViewportState>,
}

impl Viewport {
    pub fn new(height: f64) -> Self {
        Self {
            state: Mutex::new(ViewportState {
                height: height.max(0.0),
                ..ViewportState::default()
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ViewportState> {
        // The state stays consistent even if a holder panicked.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Places or moves a sentinel.
    pub fn place(&self, sentinel: SentinelId, bounds: Bounds) {
        let mut state = self.lock();
        state.elements.insert(sentinel, bounds);
        state.notify();
    }

    /// Removes a sentinel from the layout. Watches on it fall silent.
    pub fn remove(&self, sentinel: SentinelId) {
        let mut state = self.lock();
        state.elements.remove(&sentinel);
        for watch in state.watches.values_mut().filter(|w| w.sentinel == sentinel) {
            watch.last = None;
        }
    }

    /// Scrolls to an absolute offset, clamped at the top.
    pub fn scroll_to(&self, top: f64) {
        let mut state = self.lock();
        state.scroll_top = top.max(0.0);
        state.notify();
    }

    pub fn scroll_by(&self, delta: f64) {
        let top = self.scroll_top() + delta;
        self.scroll_to(top);
    }

    pub fn scroll_top(&self) -> f64 {
        self.lock().scroll_top
    }

    pub fn height(&self) -> f64 {
        self.lock().height
    }

    /// Number of live observations.
    pub fn observation_count(&self) -> usize {
        self.lock().watches.len()
    }

    /// Whether `sentinel` would currently count as visible under `options`.
    pub fn is_visible(&self, sentinel: SentinelId, options: &ObserveOptions) -> bool {
        let state = self.lock();
        state
            .elements
            .get(&sentinel)
            .is_some_and(|bounds| state.intersects(*bounds, options))
    }
}

impl VisibilityObserver for Viewport {
    fn observe(
        &self,
        sentinel: SentinelId,
        options: ObserveOptions,
    ) -> (SubscriptionId, mpsc::UnboundedReceiver<VisibilityChange>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut state = self.lock();
        let id = SubscriptionId(state.next_id);
        state.next_id += 1;
        state.watches.insert(
            id,
            Watch {
                sentinel,
                options,
                tx,
                last: None,
            },
        );
        // Initial state goes out immediately.
        state.notify();
        (id, rx)
    }

    fn unobserve(&self, id: SubscriptionId) {
        self.lock().watches.remove(&id);
    }
}
