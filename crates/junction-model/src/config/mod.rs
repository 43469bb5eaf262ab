use std::{fmt, str::FromStr, time::Duration};

use serde::{Deserialize, Serialize};

use crate::{
    DEFAULT_CLOSED_MS, DEFAULT_OPEN_MS, DEFAULT_POLL_MS,
    domain::{DurationMs, Phase},
    error::{ModelError, ModelResult},
};

/// Who drives the phase clock.
///
/// - `Auto`: the clock runs its own loop and flips on the configured durations.
/// - `Manual`: no loop is spawned; the phase only changes when the owner calls `advance`.
#[derive(Default, Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ClockMode {
    #[default]
    Auto,
    Manual,
}

impl FromStr for ClockMode {
    type Err = ModelError;
    fn from_str(s: &str) -> ModelResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" | "autonomous" | "" => Ok(ClockMode::Auto),
            "manual" => Ok(ClockMode::Manual),
            other => Err(ModelError::UnknownClockMode(other.to_string())),
        }
    }
}

impl fmt::Display for ClockMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClockMode::Auto => f.write_str("auto"),
            ClockMode::Manual => f.write_str("manual"),
        }
    }
}

/// Controller configuration, fixed at construction time.
///
/// All durations are in milliseconds and must be strictly positive.
/// Call [`ControllerConfig::validate`] before starting anything that depends on it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ControllerConfig {
    /// How long the phase stays open.
    pub open_ms: DurationMs,
    /// How long the phase stays closed.
    pub closed_ms: DurationMs,
    /// Dispatcher polling cadence. At most one unit is released per poll.
    pub poll_ms: DurationMs,
    /// Phase the clock holds right after construction.
    pub initial_phase: Phase,
    /// Whether the clock advances on its own.
    pub clock_mode: ClockMode,
    /// Optional bound on the number of waiting units (both classes together).
    ///
    /// `None` means unbounded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub queue_capacity: Option<usize>,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            open_ms: DEFAULT_OPEN_MS,
            closed_ms: DEFAULT_CLOSED_MS,
            poll_ms: DEFAULT_POLL_MS,
            initial_phase: Phase::default(),
            clock_mode: ClockMode::default(),
            queue_capacity: None,
        }
    }
}

impl ControllerConfig {
    /// Convenience constructor for the three timing knobs; everything else defaults.
    pub fn with_timings(open_ms: DurationMs, closed_ms: DurationMs, poll_ms: DurationMs) -> Self {
        Self {
            open_ms,
            closed_ms,
            poll_ms,
            ..Default::default()
        }
    }

    /// Reject non-positive durations and a zero capacity.
    pub fn validate(&self) -> ModelResult<()> {
        for (field, value) in [
            ("openMs", self.open_ms),
            ("closedMs", self.closed_ms),
            ("pollMs", self.poll_ms),
        ] {
            if value == 0 {
                return Err(ModelError::InvalidDuration { field });
            }
        }
        if self.queue_capacity == Some(0) {
            return Err(ModelError::InvalidCapacity);
        }
        Ok(())
    }

    #[inline]
    pub fn open_duration(&self) -> Duration {
        Duration::from_millis(self.open_ms)
    }

    #[inline]
    pub fn closed_duration(&self) -> Duration {
        Duration::from_millis(self.closed_ms)
    }

    #[inline]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_ms)
    }
}
