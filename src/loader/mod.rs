//! Loader Module
//!
//! Viewport-driven incremental loading: a visibility primitive and the
//! controller that turns sentinel visibility into fetch-more calls.

mod controller;
mod viewport;
mod visibility;

pub use controller::{FetchFailure, FetchFuture, IncrementalLoader};
pub use viewport::{Bounds, Viewport};
pub use visibility::{
    ObserveOptions, SentinelId, Subscription, SubscriptionId, VisibilityChange, VisibilityObserver,
};
