use std::sync::{Arc, Mutex};

use tokio::runtime::Handle;
use tokio_util::sync::CancellationToken;
use tracing::info;

use junction_model::ControllerConfig;

use crate::{
    clock::PhaseClock,
    controller::Controller,
    dispatch::Dispatcher,
    error::CoreError,
    metrics::{MetricsHandle, noop_metrics},
    observer::{ObserverHandle, ObserverSet},
    queue::AdmissionQueue,
};

/// Builder for [`Controller`].
///
/// This is the only place where the phase clock and the admission queue are created,
/// so each controller owns exactly one of each.
pub struct ControllerBuilder {
    config: ControllerConfig,
    observers: Vec<ObserverHandle>,
    metrics: MetricsHandle,
}

impl ControllerBuilder {
    pub(crate) fn new(config: ControllerConfig) -> Self {
        Self {
            config,
            observers: Vec::new(),
            metrics: noop_metrics(),
        }
    }

    /// Register an observer before the loops start.
    pub fn with_observer(mut self, observer: ObserverHandle) -> Self {
        self.observers.push(observer);
        self
    }

    /// Register several observers before the loops start.
    pub fn with_observers(mut self, observers: Vec<ObserverHandle>) -> Self {
        self.observers.extend(observers);
        self
    }

    /// Replace the metrics backend (no-op by default).
    pub fn with_metrics(mut self, metrics: MetricsHandle) -> Self {
        self.metrics = metrics;
        self
    }

    /// Validate the configuration, build the components and spawn the clock and dispatcher loops.
    ///
    /// Must be called from inside a tokio runtime. Nothing is spawned if validation fails.
    pub fn start(self) -> Result<Controller, CoreError> {
        self.config.validate()?;
        let rt = Handle::try_current().map_err(|_| CoreError::NoRuntime)?;

        let Self {
            config,
            observers,
            metrics,
        } = self;

        let cancel = CancellationToken::new();
        let observers = Arc::new(ObserverSet::new(observers, metrics.clone()));
        let queue = Arc::new(AdmissionQueue::new(config.queue_capacity));
        let clock = Arc::new(PhaseClock::new(
            &config,
            Arc::clone(&observers),
            metrics.clone(),
            cancel.child_token(),
        ));
        let dispatcher = Dispatcher::new(
            Arc::clone(&clock),
            Arc::clone(&queue),
            Arc::clone(&observers),
            metrics.clone(),
            config.poll_interval(),
            cancel.child_token(),
        );

        metrics.record_phase(clock.phase());

        let mut tasks = Vec::with_capacity(2);
        tasks.extend(clock.start(&rt));
        tasks.push(dispatcher.start(&rt));

        info!(
            mode = %config.clock_mode,
            phase = %clock.phase(),
            observers = observers.len(),
            "controller started"
        );

        Ok(Controller {
            config,
            clock,
            queue,
            observers,
            metrics,
            cancel,
            tasks: Mutex::new(tasks),
        })
    }
}
