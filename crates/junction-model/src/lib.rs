mod domain;
pub use domain::{DEFAULT_CLOSED_MS, DEFAULT_OPEN_MS, DEFAULT_POLL_MS};
pub use domain::{DurationMs, Label, Phase, Priority};

mod error;
pub use error::{ModelError, ModelResult};

mod config;
pub use config::{ClockMode, ControllerConfig};
