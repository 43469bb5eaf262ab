use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelResult};

/// Signal phase of the intersection.
///
/// Releases are permitted only while the phase is [`Phase::Open`].
/// The phase strictly alternates `Open -> Closed -> Open ...`.
#[derive(Default, Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Phase {
    /// Green light: units may cross.
    #[default]
    Open,
    /// Red light: no release may start.
    Closed,
}

impl Phase {
    /// The phase that follows this one.
    #[inline]
    pub fn next(self) -> Self {
        match self {
            Phase::Open => Phase::Closed,
            Phase::Closed => Phase::Open,
        }
    }

    #[inline]
    pub fn is_open(self) -> bool {
        matches!(self, Phase::Open)
    }

    /// Stable label value for logs and metrics.
    #[inline]
    pub fn as_label(&self) -> &'static str {
        match self {
            Phase::Open => "open",
            Phase::Closed => "closed",
        }
    }
}

impl FromStr for Phase {
    type Err = ModelError;
    fn from_str(s: &str) -> ModelResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "open" | "green" => Ok(Phase::Open),
            "closed" | "red" => Ok(Phase::Closed),
            other => Err(ModelError::UnknownPhase(other.to_string())),
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_label())
    }
}
