use junction_model::{Phase, Priority};

use crate::{
    metrics::backend::{MetricsBackend, ObserverFailure},
    queue::QueueDepth,
};

/// No-op metrics backend that compiles to nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpMetrics;

impl MetricsBackend for NoOpMetrics {
    #[inline(always)]
    fn record_enqueued(&self, _: Priority) {}

    #[inline(always)]
    fn record_released(&self, _: Priority, _: u64) {}

    #[inline(always)]
    fn record_queue_depth(&self, _: QueueDepth) {}

    #[inline(always)]
    fn record_phase(&self, _: Phase) {}

    #[inline(always)]
    fn record_phase_change(&self, _: Phase) {}

    #[inline(always)]
    fn record_observer_error(&self, _: &str, _: ObserverFailure) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noop_metrics_is_zero_size() {
        assert_eq!(std::mem::size_of::<NoOpMetrics>(), 0);
    }

    #[test]
    fn failure_labels_are_stable() {
        assert_eq!(ObserverFailure::Error.as_label(), "error");
        assert_eq!(ObserverFailure::Panic.as_label(), "panic");
    }
}
