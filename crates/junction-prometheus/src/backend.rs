use std::sync::Arc;

use prometheus::{
    CounterVec, HistogramOpts, HistogramVec, IntGauge, IntGaugeVec, Opts, Registry,
    proto::MetricFamily,
};

use junction_core::{MetricsBackend, ObserverFailure, QueueDepth};
use junction_model::{Phase, Priority};

const NAMESPACE: &str = "junction";

/// Prometheus metrics backend for the junction controller.
///
/// ## Label cardinality
/// All labels are bounded:
/// - `priority`: "normal", "emergency"
/// - `phase`: "open", "closed"
/// - `observer`: names of registered observers
/// - `kind`: "error", "panic"
#[derive(Clone)]
pub struct PrometheusMetrics {
    enqueued: CounterVec,
    released: CounterVec,
    wait: HistogramVec,
    queue_depth: IntGaugeVec,
    signal_open: IntGauge,
    transitions: CounterVec,
    observer_errors: CounterVec,
    registry: Arc<Registry>,
}

impl PrometheusMetrics {
    /// Create the backend and register its metrics in `registry`.
    pub fn new_with_registry(registry: Arc<Registry>) -> Result<Self, prometheus::Error> {
        let enqueued = CounterVec::new(
            Opts::new("units_enqueued_total", "Units admitted to the queue").namespace(NAMESPACE),
            &["priority"],
        )?;
        registry.register(Box::new(enqueued.clone()))?;

        let released = CounterVec::new(
            Opts::new("units_released_total", "Units released through the junction")
                .namespace(NAMESPACE),
            &["priority"],
        )?;
        registry.register(Box::new(released.clone()))?;

        let wait = HistogramVec::new(
            HistogramOpts::new("unit_wait_seconds", "Time from arrival to release in seconds")
                .namespace(NAMESPACE)
                .buckets(vec![0.1, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 300.0]),
            &["priority"],
        )?;
        registry.register(Box::new(wait.clone()))?;

        let queue_depth = IntGaugeVec::new(
            Opts::new("queue_depth", "Units currently waiting").namespace(NAMESPACE),
            &["priority"],
        )?;
        registry.register(Box::new(queue_depth.clone()))?;

        let signal_open = IntGauge::with_opts(
            Opts::new("signal_open", "1 while the phase is open, 0 while closed")
                .namespace(NAMESPACE),
        )?;
        registry.register(Box::new(signal_open.clone()))?;

        let transitions = CounterVec::new(
            Opts::new("phase_transitions_total", "Completed phase transitions by new phase")
                .namespace(NAMESPACE),
            &["phase"],
        )?;
        registry.register(Box::new(transitions.clone()))?;

        let observer_errors = CounterVec::new(
            Opts::new("observer_errors_total", "Failed or panicked observer calls")
                .namespace(NAMESPACE),
            &["observer", "kind"],
        )?;
        registry.register(Box::new(observer_errors.clone()))?;

        Ok(Self {
            enqueued,
            released,
            wait,
            queue_depth,
            signal_open,
            transitions,
            observer_errors,
            registry,
        })
    }

    /// Create the backend with a fresh registry.
    pub fn new() -> Result<Self, prometheus::Error> {
        Self::new_with_registry(Arc::new(Registry::new()))
    }

    /// Gather all metrics for exposition.
    pub fn gather(&self) -> Vec<MetricFamily> {
        self.registry.gather()
    }

    /// Underlying registry, for registering application metrics next to these.
    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }
}

impl MetricsBackend for PrometheusMetrics {
    fn record_enqueued(&self, priority: Priority) {
        self.enqueued
            .with_label_values(&[priority.as_label()])
            .inc();
    }

    fn record_released(&self, priority: Priority, waited_ms: u64) {
        self.released
            .with_label_values(&[priority.as_label()])
            .inc();
        self.wait
            .with_label_values(&[priority.as_label()])
            .observe(waited_ms as f64 / 1000.0);
    }

    fn record_queue_depth(&self, depth: QueueDepth) {
        self.queue_depth
            .with_label_values(&[Priority::Emergency.as_label()])
            .set(depth.emergency as i64);
        self.queue_depth
            .with_label_values(&[Priority::Normal.as_label()])
            .set(depth.normal as i64);
    }

    fn record_phase(&self, phase: Phase) {
        self.signal_open.set(i64::from(phase.is_open()));
    }

    fn record_phase_change(&self, phase: Phase) {
        self.record_phase(phase);
        self.transitions.with_label_values(&[phase.as_label()]).inc();
    }

    fn record_observer_error(&self, observer: &str, failure: ObserverFailure) {
        self.observer_errors
            .with_label_values(&[observer, failure.as_label()])
            .inc();
    }
}
