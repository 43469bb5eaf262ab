use std::{fmt, time::Duration};

use tokio::time::Instant;

use junction_model::{Label, Priority};

use crate::unit::{Unit, UnitId, marker};

/// Emitted once per released unit, from the dispatcher task.
///
/// Carries the unit itself: after release the controller keeps no reference to it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReleaseEvent {
    pub id: UnitId,
    pub label: Label,
    pub priority: Priority,
    pub arrival_seq: u64,
    /// `release_time - arrival_time`.
    pub waited: Duration,
}

impl ReleaseEvent {
    pub(crate) fn from_unit(unit: Unit, released_at: Instant) -> Self {
        let waited = unit.waited(released_at);
        Self {
            id: unit.id,
            label: unit.label,
            priority: unit.priority,
            arrival_seq: unit.arrival_seq,
            waited,
        }
    }

    /// Wait duration in whole milliseconds, saturating.
    #[inline]
    pub fn waited_ms(&self) -> u64 {
        u64::try_from(self.waited.as_millis()).unwrap_or(u64::MAX)
    }
}

impl fmt::Display for ReleaseEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} passed the intersection after {}ms",
            marker(self.priority),
            self.label,
            self.waited_ms()
        )
    }
}
