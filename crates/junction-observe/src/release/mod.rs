#![cfg(feature = "release-log")]

//! Release logging observer for the junction controller.
//!
//! Maps controller events to structured tracing records.

use junction_core::{ObserverError, ReleaseEvent, ReleaseObserver};
use junction_model::{Phase, Priority};
use tracing::{info, warn};

/// Observer that logs every released unit and every signal change.
///
/// Emergency releases go out at `warn` so they stand out in a busy log.
#[derive(Debug, Default, Clone, Copy)]
pub struct ReleaseLogger;

impl ReleaseObserver for ReleaseLogger {
    fn name(&self) -> &'static str {
        "release-logger"
    }

    fn on_release(&self, event: &ReleaseEvent) -> Result<(), ObserverError> {
        log_release(event);
        Ok(())
    }

    fn on_phase(&self, phase: Phase) {
        info!(signal = signal_name(phase), "signal changed");
    }
}

fn log_release(e: &ReleaseEvent) {
    match e.priority {
        Priority::Emergency => warn!(
            unit = %e.id,
            label = %e.label,
            seq = e.arrival_seq,
            waited_ms = e.waited_ms(),
            "emergency unit passed"
        ),
        Priority::Normal => info!(
            unit = %e.id,
            label = %e.label,
            seq = e.arrival_seq,
            waited_ms = e.waited_ms(),
            "unit passed"
        ),
    }
}

/// Traffic-light name for a phase.
#[inline]
pub fn signal_name(phase: Phase) -> &'static str {
    match phase {
        Phase::Open => "GREEN",
        Phase::Closed => "RED",
    }
}
