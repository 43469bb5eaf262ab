//! Units waiting at the intersection and their read-only views.
use std::{fmt, time::Duration};

use tokio::time::Instant;

use junction_model::{Label, Priority};

/// Identifier handed back to the caller of `enqueue`.
///
/// Derived from the arrival sequence, so it is unique for the lifetime of one controller.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct UnitId(u64);

impl UnitId {
    #[inline]
    pub(crate) fn from_seq(seq: u64) -> Self {
        Self(seq)
    }

    /// Raw numeric value.
    #[inline]
    pub fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unit-{}", self.0)
    }
}

/// A unit owned by the admission queue while it waits.
///
/// Only the queue creates units; ownership moves into the [`crate::ReleaseEvent`] on release.
#[derive(Debug)]
pub struct Unit {
    pub(crate) id: UnitId,
    pub(crate) label: Label,
    pub(crate) priority: Priority,
    pub(crate) arrival_seq: u64,
    pub(crate) arrived_at: Instant,
}

impl Unit {
    pub(crate) fn new(seq: u64, label: Label, priority: Priority, arrived_at: Instant) -> Self {
        Self {
            id: UnitId::from_seq(seq),
            label,
            priority,
            arrival_seq: seq,
            arrived_at,
        }
    }

    pub fn id(&self) -> UnitId {
        self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn priority(&self) -> Priority {
        self.priority
    }

    pub fn arrival_seq(&self) -> u64 {
        self.arrival_seq
    }

    /// Time spent waiting as of `now`.
    #[inline]
    pub fn waited(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.arrived_at)
    }

    /// Detached copy of this unit as seen at `now`.
    pub(crate) fn view(&self, now: Instant) -> UnitView {
        UnitView {
            id: self.id,
            label: self.label.clone(),
            priority: self.priority,
            arrival_seq: self.arrival_seq,
            wait_so_far: self.waited(now),
        }
    }
}

/// Point-in-time copy of a waiting unit returned by `snapshot`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnitView {
    pub id: UnitId,
    pub label: Label,
    pub priority: Priority,
    pub arrival_seq: u64,
    pub wait_so_far: Duration,
}

impl fmt::Display for UnitView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} (#{}, waiting {}ms)",
            marker(self.priority),
            self.label,
            self.arrival_seq,
            self.wait_so_far.as_millis()
        )
    }
}

/// Short class marker used in human-readable output.
pub(crate) fn marker(priority: Priority) -> &'static str {
    if priority.is_emergency() {
        "[EMERGENCY]"
    } else {
        "[normal]"
    }
}
