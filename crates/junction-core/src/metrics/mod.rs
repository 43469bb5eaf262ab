//! Metrics collection abstraction for the junction controller.
//!
//! Backends (prometheus, statsd, etc) implement [`MetricsBackend`] and are injected through
//! [`crate::ControllerBuilder::with_metrics`].
mod backend;
pub use backend::{MetricsBackend, MetricsHandle, ObserverFailure};

mod noop;
pub use noop::NoOpMetrics;

use std::sync::Arc;

/// Create a no-op metrics handle.
#[inline]
pub fn noop_metrics() -> MetricsHandle {
    Arc::new(NoOpMetrics)
}
