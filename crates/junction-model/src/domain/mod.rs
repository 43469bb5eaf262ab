mod priority;
pub use priority::Priority;

mod phase;
pub use phase::Phase;

/// Free-form descriptive tag attached to a unit (e.g. `"car"`, `"ambulance"`).
///
/// Cosmetic only: it never affects ordering.
pub type Label = String;

/// Duration value in milliseconds.
///
/// Used in controller configuration where every duration must be strictly positive.
pub type DurationMs = u64;

/// Default length of the open phase.
pub const DEFAULT_OPEN_MS: DurationMs = 5_000;

/// Default length of the closed phase.
pub const DEFAULT_CLOSED_MS: DurationMs = 3_000;

/// Default dispatcher polling cadence.
pub const DEFAULT_POLL_MS: DurationMs = 1_000;
