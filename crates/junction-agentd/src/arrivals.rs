//! Synthetic traffic: a steady arrivals stream plus a periodic queue report.
use std::{sync::Arc, time::Duration};

use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use junction_core::Controller;
use junction_model::{Label, Priority};

/// Label and class of the `n`-th arrival (1-based).
pub fn arrival(n: u64, emergency_every: u64) -> (Label, Priority) {
    if emergency_every > 0 && n % emergency_every == 0 {
        (format!("ambulance-{n}"), Priority::Emergency)
    } else {
        (format!("car-{n}"), Priority::Normal)
    }
}

/// Enqueue one unit per `interval` until cancelled.
pub async fn run_arrivals(
    controller: Arc<Controller>,
    interval: Duration,
    emergency_every: u64,
    cancel: CancellationToken,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut n = 0u64;

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {
                n += 1;
                let (label, priority) = arrival(n, emergency_every);
                if let Err(e) = controller.enqueue(label, priority) {
                    warn!(error = %e, "arrival rejected");
                }
            }
        }
    }
    debug!(arrivals = n, "arrivals generator stopped");
}

/// Log the queue contents every `period` until cancelled.
pub async fn run_snapshots(controller: Arc<Controller>, period: Duration, cancel: CancellationToken) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => log_snapshot(&controller),
        }
    }
}

pub fn log_snapshot(controller: &Controller) {
    let waiting = controller.snapshot();
    info!(
        phase = %controller.phase(),
        depth = %controller.depth(),
        "queue snapshot"
    );
    for view in &waiting {
        debug!("  {view}");
    }
}
