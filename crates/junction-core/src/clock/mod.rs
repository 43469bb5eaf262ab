//! Free-running phase clock.
//!
//! The phase is a single atomic flag with one writer (the clock loop in auto mode,
//! the controller's `advance` in manual mode). Readers use acquire loads and always
//! see the last completed flip.
use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicU64, Ordering},
    },
    time::Duration,
};

use tokio::{runtime::Handle, task::JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use junction_model::{ClockMode, ControllerConfig, Phase};

use crate::{error::CoreError, metrics::MetricsHandle, observer::ObserverSet};

pub(crate) struct PhaseClock {
    open: AtomicBool,
    transitions: AtomicU64,
    open_for: Duration,
    closed_for: Duration,
    mode: ClockMode,
    observers: Arc<ObserverSet>,
    metrics: MetricsHandle,
    cancel: CancellationToken,
}

impl PhaseClock {
    /// Build a stopped clock holding `cfg.initial_phase`.
    ///
    /// `cancel` is usually a child of the controller's token.
    pub(crate) fn new(
        cfg: &ControllerConfig,
        observers: Arc<ObserverSet>,
        metrics: MetricsHandle,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            open: AtomicBool::new(cfg.initial_phase.is_open()),
            transitions: AtomicU64::new(0),
            open_for: cfg.open_duration(),
            closed_for: cfg.closed_duration(),
            mode: cfg.clock_mode,
            observers,
            metrics,
            cancel,
        }
    }

    /// Current phase. Never blocks, never allocates.
    #[inline]
    pub(crate) fn phase(&self) -> Phase {
        if self.is_open() {
            Phase::Open
        } else {
            Phase::Closed
        }
    }

    #[inline]
    pub(crate) fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire)
    }

    /// Number of completed flips since construction.
    pub(crate) fn transitions(&self) -> u64 {
        self.transitions.load(Ordering::Acquire)
    }

    pub(crate) fn mode(&self) -> ClockMode {
        self.mode
    }

    /// How long the clock holds `phase` before flipping.
    fn hold_for(&self, phase: Phase) -> Duration {
        match phase {
            Phase::Open => self.open_for,
            Phase::Closed => self.closed_for,
        }
    }

    /// Spawn the alternation loop on `rt`.
    ///
    /// Returns `None` in manual mode: nothing runs and the phase only changes via [`Self::advance`].
    pub(crate) fn start(self: &Arc<Self>, rt: &Handle) -> Option<JoinHandle<()>> {
        match self.mode {
            ClockMode::Manual => {
                info!(phase = %self.phase(), "phase clock in manual mode");
                None
            }
            ClockMode::Auto => {
                let clock = Arc::clone(self);
                Some(rt.spawn(clock.run()))
            }
        }
    }

    /// Stop the alternation loop; the phase stays at its current value.
    pub(crate) fn stop(&self) {
        self.cancel.cancel();
    }

    /// Flip the phase by hand. Only allowed in manual mode.
    pub(crate) fn advance(&self) -> Result<Phase, CoreError> {
        match self.mode {
            ClockMode::Auto => Err(CoreError::ClockAutonomous),
            ClockMode::Manual => Ok(self.flip()),
        }
    }

    async fn run(self: Arc<Self>) {
        info!(
            phase = %self.phase(),
            open_ms = self.open_for.as_millis() as u64,
            closed_ms = self.closed_for.as_millis() as u64,
            "phase clock started"
        );
        loop {
            let wait = self.hold_for(self.phase());
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    debug!(phase = %self.phase(), "phase clock stopped");
                    break;
                }
                _ = tokio::time::sleep(wait) => {
                    self.flip();
                }
            }
        }
    }

    /// Single writer path: publish the next phase, then report it.
    ///
    /// The read and the write are one `fetch_xor`, so concurrent manual advances never
    /// collapse into a single flip.
    fn flip(&self) -> Phase {
        let was_open = self.open.fetch_xor(true, Ordering::AcqRel);
        let next = if was_open { Phase::Closed } else { Phase::Open };
        let n = self.transitions.fetch_add(1, Ordering::AcqRel) + 1;

        info!(phase = %next, transition = n, "phase changed");
        self.metrics.record_phase_change(next);
        self.observers.notify_phase(next);
        next
    }
}
