//! Composition root: owns the phase clock, the admission queue and the observer set,
//! runs the clock and dispatcher loops, and exposes the public operations.
mod builder;
pub use builder::ControllerBuilder;

use std::{
    fmt,
    sync::{Arc, Mutex, PoisonError},
};

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use junction_model::{ControllerConfig, Label, Phase, Priority};

use crate::{
    clock::PhaseClock,
    error::CoreError,
    metrics::MetricsHandle,
    observer::{FnObserver, ObserverHandle, ObserverSet, ReleaseEvent},
    queue::{AdmissionQueue, QueueDepth},
    unit::{UnitId, UnitView},
};

/// Intersection controller.
///
/// All methods take `&self` and may be called concurrently from any thread;
/// wrap the controller in an [`Arc`] to share it.
pub struct Controller {
    config: ControllerConfig,
    clock: Arc<PhaseClock>,
    queue: Arc<AdmissionQueue>,
    observers: Arc<ObserverSet>,
    metrics: MetricsHandle,
    cancel: CancellationToken,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl Controller {
    /// Start building a controller with the given configuration.
    pub fn builder(config: ControllerConfig) -> ControllerBuilder {
        ControllerBuilder::new(config)
    }

    /// Start a controller with no observers and no-op metrics.
    pub fn start(config: ControllerConfig) -> Result<Self, CoreError> {
        Self::builder(config).start()
    }

    /// Admit a unit.
    ///
    /// After [`Controller::shutdown`] the unit is still accepted and stays visible in
    /// [`Controller::snapshot`], but it will not be released.
    #[instrument(level = "debug", skip_all, fields(priority = %priority))]
    pub fn enqueue(&self, label: impl Into<Label>, priority: Priority) -> Result<UnitId, CoreError> {
        if self.is_shutting_down() {
            warn!("enqueue after shutdown; release is not guaranteed");
        }
        let id = self.queue.enqueue(label, priority)?;

        self.metrics.record_enqueued(priority);
        self.metrics.record_queue_depth(self.queue.depth());
        debug!(unit = %id, "unit enqueued");
        Ok(id)
    }

    /// `true` while releases are permitted.
    #[inline]
    pub fn is_open(&self) -> bool {
        self.clock.is_open()
    }

    #[inline]
    pub fn phase(&self) -> Phase {
        self.clock.phase()
    }

    /// Completed phase transitions since start.
    pub fn transitions(&self) -> u64 {
        self.clock.transitions()
    }

    /// Flip the phase by hand and return the new phase.
    ///
    /// Only available with `clockMode = manual`; an autonomous clock stays the single writer.
    #[instrument(level = "debug", skip(self))]
    pub fn advance_phase(&self) -> Result<Phase, CoreError> {
        self.clock.advance()
    }

    /// Point-in-time copy of the waiting units, emergency first, each class in arrival order.
    pub fn snapshot(&self) -> Vec<UnitView> {
        self.queue.snapshot()
    }

    /// Number of waiting units per class.
    pub fn depth(&self) -> QueueDepth {
        self.queue.depth()
    }

    /// Register a closure called once per released unit, from the dispatcher task.
    ///
    /// The closure must not block.
    pub fn on_release<F>(&self, f: F)
    where
        F: Fn(&ReleaseEvent) + Send + Sync + 'static,
    {
        self.add_observer(Arc::new(FnObserver::new("callback", f)));
    }

    /// Register an observer while the controller is running.
    pub fn add_observer(&self, observer: ObserverHandle) {
        debug!(observer = observer.name(), "observer registered");
        self.observers.register(observer);
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    /// `true` once shutdown has been requested.
    pub fn is_shutting_down(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Stop the clock and dispatcher loops and wait for them to exit.
    ///
    /// Each loop finishes its current tick/wait first. Waiting units are kept and
    /// remain inspectable through [`Controller::snapshot`]. Calling this twice is harmless.
    pub async fn shutdown(&self) {
        self.cancel.cancel();
        self.clock.stop();

        let tasks: Vec<JoinHandle<()>> = self
            .tasks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain(..)
            .collect();

        for task in tasks {
            if let Err(e) = task.await {
                warn!(error = %e, "controller task ended abnormally");
            }
        }
        info!(
            phase = %self.phase(),
            waiting = self.queue.depth().total(),
            "controller stopped"
        );
    }
}

impl Drop for Controller {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

impl fmt::Debug for Controller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Controller")
            .field("mode", &self.clock.mode())
            .field("phase", &self.phase())
            .field("depth", &self.depth())
            .field("observers", &self.observers.len())
            .field("shutting_down", &self.is_shutting_down())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::{
        sync::atomic::{AtomicUsize, Ordering},
        time::Duration,
    };

    use tokio::{sync::mpsc, time::Instant};

    use junction_model::{ClockMode, ModelError};

    use crate::{
        metrics::{MetricsBackend, ObserverFailure},
        observer::{ChannelObserver, ObserverError, ReleaseObserver},
        queue::QueueError,
    };

    #[derive(Default)]
    struct PhaseMetrics {
        current: Mutex<Option<Phase>>,
        changes: AtomicUsize,
    }

    impl MetricsBackend for PhaseMetrics {
        fn record_enqueued(&self, _: Priority) {}
        fn record_released(&self, _: Priority, _: u64) {}
        fn record_queue_depth(&self, _: QueueDepth) {}
        fn record_phase(&self, phase: Phase) {
            *self.current.lock().unwrap() = Some(phase);
        }
        fn record_phase_change(&self, phase: Phase) {
            self.changes.fetch_add(1, Ordering::SeqCst);
            *self.current.lock().unwrap() = Some(phase);
        }
        fn record_observer_error(&self, _: &str, _: ObserverFailure) {}
    }

    fn manual(initial_phase: Phase) -> ControllerConfig {
        ControllerConfig {
            clock_mode: ClockMode::Manual,
            initial_phase,
            ..ControllerConfig::with_timings(100, 100, 10)
        }
    }

    fn start_with_channel(
        cfg: ControllerConfig,
    ) -> (Controller, mpsc::UnboundedReceiver<ReleaseEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let controller = Controller::builder(cfg)
            .with_observer(Arc::new(ChannelObserver::new(tx)))
            .start()
            .expect("controller starts");
        (controller, rx)
    }

    #[test]
    fn invalid_config_is_rejected_before_start() {
        let err = Controller::start(ControllerConfig::with_timings(100, 0, 10)).unwrap_err();
        assert!(matches!(
            err,
            CoreError::Config(ModelError::InvalidDuration { field: "closedMs" })
        ));
    }

    #[test]
    fn start_requires_runtime() {
        let err = Controller::start(ControllerConfig::default()).unwrap_err();
        assert!(matches!(err, CoreError::NoRuntime));
    }

    #[tokio::test(start_paused = true)]
    async fn no_release_while_closed_then_priority_order() {
        let (controller, mut rx) = start_with_channel(manual(Phase::Closed));

        controller.enqueue("car-1", Priority::Normal).unwrap();
        controller.enqueue("car-2", Priority::Normal).unwrap();
        controller.enqueue("ambulance-1", Priority::Emergency).unwrap();

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(!controller.is_open());
        assert!(rx.try_recv().is_err(), "no release may happen while closed");
        assert_eq!(controller.depth(), QueueDepth { emergency: 1, normal: 2 });

        assert_eq!(controller.advance_phase().unwrap(), Phase::Open);

        let mut order = Vec::new();
        for _ in 0..3 {
            order.push(rx.recv().await.expect("release event").label);
        }
        assert_eq!(order, ["ambulance-1", "car-1", "car-2"]);

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(rx.try_recv().is_err());
        assert!(controller.snapshot().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn release_waits_for_first_open_phase() {
        let cfg = ControllerConfig {
            initial_phase: Phase::Closed,
            ..ControllerConfig::with_timings(100, 100, 10)
        };
        let (controller, mut rx) = start_with_channel(cfg);

        let t0 = Instant::now();
        controller.enqueue("car-1", Priority::Normal).unwrap();

        let event = rx.recv().await.expect("release event");
        assert!(t0.elapsed() >= Duration::from_millis(100));
        assert!(event.waited >= Duration::from_millis(100));
        assert_eq!(event.label, "car-1");
        assert!(controller.transitions() >= 1);
    }

    #[tokio::test(start_paused = true)]
    async fn one_release_per_poll_tick() {
        let (controller, mut rx) = start_with_channel(manual(Phase::Closed));
        for i in 0..3 {
            controller.enqueue(format!("car-{i}"), Priority::Normal).unwrap();
        }

        controller.advance_phase().unwrap();
        let first = rx.recv().await.unwrap();
        let t1 = Instant::now();
        let second = rx.recv().await.unwrap();

        assert!(t1.elapsed() >= Duration::from_millis(10));
        assert!(second.arrival_seq > first.arrival_seq);
    }

    #[tokio::test(start_paused = true)]
    async fn closing_mid_drain_stops_releases() {
        let (controller, mut rx) = start_with_channel(manual(Phase::Open));
        for i in 0..5 {
            controller.enqueue(format!("car-{i}"), Priority::Normal).unwrap();
        }

        rx.recv().await.unwrap();
        assert_eq!(controller.advance_phase().unwrap(), Phase::Closed);

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(rx.try_recv().is_err());
        assert_eq!(controller.snapshot().len(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn failing_observer_does_not_stall_dispatch() {
        struct Broken;

        impl ReleaseObserver for Broken {
            fn name(&self) -> &'static str {
                "broken"
            }

            fn on_release(&self, _event: &ReleaseEvent) -> Result<(), ObserverError> {
                panic!("display went away")
            }
        }

        let (tx, mut rx) = mpsc::unbounded_channel();
        let controller = Controller::builder(manual(Phase::Open))
            .with_observers(vec![
                Arc::new(Broken) as ObserverHandle,
                Arc::new(ChannelObserver::new(tx)),
            ])
            .start()
            .unwrap();

        controller.enqueue("car-1", Priority::Normal).unwrap();
        controller.enqueue("car-2", Priority::Normal).unwrap();

        assert_eq!(rx.recv().await.unwrap().label, "car-1");
        assert_eq!(rx.recv().await.unwrap().label, "car-2");
    }

    #[tokio::test(start_paused = true)]
    async fn on_release_callback_registered_after_start() {
        let controller = Controller::start(manual(Phase::Open)).unwrap();
        let released = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&released);
        controller.on_release(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        controller.enqueue("car-1", Priority::Normal).unwrap();
        controller.enqueue("fire-1", Priority::Emergency).unwrap();

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(released.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_keeps_waiting_units_and_accepts_late_enqueue() {
        let cfg = ControllerConfig {
            initial_phase: Phase::Closed,
            ..ControllerConfig::with_timings(100, 60_000, 10)
        };
        let (controller, mut rx) = start_with_channel(cfg);

        controller.enqueue("car-1", Priority::Normal).unwrap();
        controller.enqueue("ambulance-1", Priority::Emergency).unwrap();

        controller.shutdown().await;
        assert!(controller.is_shutting_down());

        let late = controller.enqueue("car-2", Priority::Normal).unwrap();
        assert_eq!(late.get(), 3);

        let labels: Vec<String> = controller.snapshot().into_iter().map(|v| v.label).collect();
        assert_eq!(labels, ["ambulance-1", "car-1", "car-2"]);

        tokio::time::sleep(Duration::from_secs(120)).await;
        assert!(rx.try_recv().is_err());
        assert_eq!(controller.phase(), Phase::Closed);

        controller.shutdown().await;
    }

    #[tokio::test]
    async fn initial_phase_is_reported_to_metrics_at_start() {
        for initial in [Phase::Open, Phase::Closed] {
            let metrics = Arc::new(PhaseMetrics::default());
            let controller = Controller::builder(manual(initial))
                .with_metrics(metrics.clone())
                .start()
                .unwrap();

            assert_eq!(*metrics.current.lock().unwrap(), Some(initial));
            assert_eq!(metrics.changes.load(Ordering::SeqCst), 0);

            let next = controller.advance_phase().unwrap();
            assert_eq!(*metrics.current.lock().unwrap(), Some(next));
            assert_eq!(metrics.changes.load(Ordering::SeqCst), 1);
            controller.shutdown().await;
        }
    }

    #[tokio::test]
    async fn manual_control_rejected_for_autonomous_clock() {
        let controller = Controller::start(ControllerConfig::default()).unwrap();
        assert!(matches!(
            controller.advance_phase(),
            Err(CoreError::ClockAutonomous)
        ));
        controller.shutdown().await;
    }

    #[tokio::test]
    async fn bounded_queue_reports_full() {
        let cfg = ControllerConfig {
            queue_capacity: Some(1),
            ..manual(Phase::Closed)
        };
        let controller = Controller::start(cfg).unwrap();

        controller.enqueue("car-1", Priority::Normal).unwrap();
        let err = controller.enqueue("car-2", Priority::Normal).unwrap_err();
        assert!(matches!(
            err,
            CoreError::Queue(QueueError::Full { capacity: 1 })
        ));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_callers_are_all_released_in_arrival_order() {
        let (controller, mut rx) = start_with_channel(ControllerConfig {
            clock_mode: ClockMode::Manual,
            initial_phase: Phase::Closed,
            ..ControllerConfig::with_timings(100, 100, 1)
        });
        let controller = Arc::new(controller);

        let callers: Vec<_> = (0..100)
            .map(|i| {
                let controller = Arc::clone(&controller);
                tokio::spawn(async move {
                    controller
                        .enqueue(format!("car-{i}"), Priority::Normal)
                        .unwrap()
                })
            })
            .collect();
        for caller in callers {
            caller.await.unwrap();
        }
        assert_eq!(controller.depth().normal, 100);

        controller.advance_phase().unwrap();

        let mut seqs = Vec::with_capacity(100);
        let mut labels = std::collections::HashSet::new();
        for _ in 0..100 {
            let event = rx.recv().await.unwrap();
            seqs.push(event.arrival_seq);
            labels.insert(event.label);
        }

        assert_eq!(labels.len(), 100);
        assert!(seqs.windows(2).all(|w| w[0] < w[1]));
        controller.shutdown().await;
    }
}
