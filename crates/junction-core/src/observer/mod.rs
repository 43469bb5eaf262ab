//! Release observers.
//!
//! Observers are called synchronously from the dispatcher task (releases) and from
//! the clock task (phase changes). A failing or panicking observer is isolated:
//! it is logged and counted, and the dispatch loop keeps going.
mod error;
pub use error::ObserverError;

mod event;
pub use event::ReleaseEvent;

mod adapters;
pub use adapters::{ChannelObserver, FnObserver};

use std::{
    any::Any,
    panic::{AssertUnwindSafe, catch_unwind},
    sync::{Arc, PoisonError, RwLock},
};

use tracing::{error, warn};

use junction_model::Phase;

use crate::metrics::{MetricsHandle, ObserverFailure};

/// Receiver of controller events.
///
/// Implementations must return quickly: they run inline on the controller's tasks.
pub trait ReleaseObserver: Send + Sync + 'static {
    /// Observer name used in logs and metrics.
    fn name(&self) -> &'static str;

    /// Called once per released unit.
    ///
    /// The unit is considered released whatever this returns.
    fn on_release(&self, event: &ReleaseEvent) -> Result<(), ObserverError>;

    /// Called after every completed phase transition with the new phase.
    fn on_phase(&self, _phase: Phase) {}
}

/// Shared handle to an observer.
pub type ObserverHandle = Arc<dyn ReleaseObserver>;

/// Registered observers, shared by the clock and the dispatcher.
pub(crate) struct ObserverSet {
    observers: RwLock<Vec<ObserverHandle>>,
    metrics: MetricsHandle,
}

impl ObserverSet {
    pub(crate) fn new(observers: Vec<ObserverHandle>, metrics: MetricsHandle) -> Self {
        Self {
            observers: RwLock::new(observers),
            metrics,
        }
    }

    pub(crate) fn register(&self, observer: ObserverHandle) {
        self.observers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(observer);
    }

    pub(crate) fn len(&self) -> usize {
        self.current().len()
    }

    // Clone the handles so no lock is held while observers run.
    fn current(&self) -> Vec<ObserverHandle> {
        self.observers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Deliver a release to every observer; returns how many of them failed.
    pub(crate) fn notify_release(&self, event: &ReleaseEvent) -> usize {
        let mut failed = 0;
        for observer in self.current() {
            match catch_unwind(AssertUnwindSafe(|| observer.on_release(event))) {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    failed += 1;
                    warn!(
                        observer = observer.name(),
                        unit = %event.id,
                        error = %e,
                        "release observer failed"
                    );
                    self.metrics
                        .record_observer_error(observer.name(), ObserverFailure::Error);
                }
                Err(payload) => {
                    failed += 1;
                    error!(
                        observer = observer.name(),
                        unit = %event.id,
                        reason = %panic_message(payload.as_ref()),
                        "release observer panicked"
                    );
                    self.metrics
                        .record_observer_error(observer.name(), ObserverFailure::Panic);
                }
            }
        }
        failed
    }

    /// Deliver a phase change to every observer.
    pub(crate) fn notify_phase(&self, phase: Phase) {
        for observer in self.current() {
            if let Err(payload) = catch_unwind(AssertUnwindSafe(|| observer.on_phase(phase))) {
                error!(
                    observer = observer.name(),
                    phase = %phase,
                    reason = %panic_message(payload.as_ref()),
                    "phase observer panicked"
                );
                self.metrics
                    .record_observer_error(observer.name(), ObserverFailure::Panic);
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
