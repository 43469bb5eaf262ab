//! Dispatcher loop: at most one release per poll tick, only while the phase is open.
use std::{sync::Arc, time::Duration};

use tokio::{
    runtime::Handle,
    task::JoinHandle,
    time::{Instant, MissedTickBehavior},
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace};

use crate::{
    clock::PhaseClock,
    metrics::MetricsHandle,
    observer::{ObserverSet, ReleaseEvent},
    queue::AdmissionQueue,
};

/// Outcome of a single dispatcher tick.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Tick {
    /// Phase closed: nothing attempted.
    Idle,
    /// Phase open but nobody is waiting.
    Empty,
    /// One unit released.
    Released(ReleaseEvent),
}

impl Tick {
    #[inline]
    fn is_active(&self) -> bool {
        !matches!(self, Tick::Idle)
    }
}

pub(crate) struct Dispatcher {
    clock: Arc<PhaseClock>,
    queue: Arc<AdmissionQueue>,
    observers: Arc<ObserverSet>,
    metrics: MetricsHandle,
    poll: Duration,
    cancel: CancellationToken,
}

impl Dispatcher {
    pub(crate) fn new(
        clock: Arc<PhaseClock>,
        queue: Arc<AdmissionQueue>,
        observers: Arc<ObserverSet>,
        metrics: MetricsHandle,
        poll: Duration,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            clock,
            queue,
            observers,
            metrics,
            poll,
            cancel,
        }
    }

    /// Spawn the polling loop on `rt`.
    pub(crate) fn start(self, rt: &Handle) -> JoinHandle<()> {
        rt.spawn(self.run())
    }

    /// Do exactly one tick's worth of work.
    ///
    /// The phase is read once; if it is open at most one unit is taken.
    /// Observer failures are contained in [`ObserverSet::notify_release`].
    pub(crate) fn dispatch_once(&self) -> Tick {
        if !self.clock.is_open() {
            return Tick::Idle;
        }
        let Some(unit) = self.queue.take_next() else {
            return Tick::Empty;
        };

        let event = ReleaseEvent::from_unit(unit, Instant::now());
        debug!(
            unit = %event.id,
            label = %event.label,
            priority = %event.priority,
            waited_ms = event.waited_ms(),
            "unit released"
        );
        self.metrics
            .record_released(event.priority, event.waited_ms());
        self.metrics.record_queue_depth(self.queue.depth());
        self.observers.notify_release(&event);

        Tick::Released(event)
    }

    async fn run(self) {
        info!(poll_ms = self.poll.as_millis() as u64, "dispatcher started");

        let mut ticker = tokio::time::interval(self.poll);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut active = false;

        loop {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    debug!("dispatcher stopped");
                    break;
                }
                _ = ticker.tick() => {
                    let tick = self.dispatch_once();
                    if tick.is_active() != active {
                        active = tick.is_active();
                        trace!(active, "dispatcher state changed");
                    }
                }
            }
        }
    }
}
