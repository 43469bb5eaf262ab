use std::sync::Arc;

use junction_model::{Phase, Priority};

use crate::queue::QueueDepth;

/// How a release observer failed, for metrics classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObserverFailure {
    /// Observer returned an error.
    Error,
    /// Observer panicked.
    Panic,
}

impl ObserverFailure {
    /// Return label value for metrics.
    #[inline]
    pub fn as_label(&self) -> &'static str {
        match self {
            ObserverFailure::Error => "error",
            ObserverFailure::Panic => "panic",
        }
    }
}

/// Backend metrics collection interface.
///
/// Every method is called inline from the controller (enqueue caller, clock task or
/// dispatcher task), so implementations must be cheap and must not block.
pub trait MetricsBackend: Send + Sync + 'static {
    /// Record a unit admitted into the queue.
    fn record_enqueued(&self, priority: Priority);
    /// Record a unit released for crossing.
    ///
    /// # Arguments
    /// - `priority`: class of the released unit
    /// - `waited_ms`: time between admission and release in milliseconds
    fn record_released(&self, priority: Priority, waited_ms: u64);
    /// Record the queue depth after a change.
    fn record_queue_depth(&self, depth: QueueDepth);
    /// Record the current phase without counting a transition.
    ///
    /// Called once at start with the initial phase.
    fn record_phase(&self, phase: Phase);
    /// Record a completed phase transition; `phase` is the new phase.
    fn record_phase_change(&self, phase: Phase);
    /// Record a failing release observer.
    ///
    /// This is separate from releases: the unit counts as released regardless.
    fn record_observer_error(&self, observer: &str, failure: ObserverFailure);
}

/// Shared handle to metrics backend.
pub type MetricsHandle = Arc<dyn MetricsBackend>;
