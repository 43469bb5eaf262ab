use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelResult};

/// Release class of a unit.
///
/// Fixed when the unit is admitted. Every waiting `Emergency` unit is released
/// before any `Normal` one; within a class units leave in arrival order.
#[derive(Default, Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Priority {
    /// Regular traffic, served FIFO.
    #[default]
    Normal,
    /// Emergency vehicles (ambulance, fire truck), always served first.
    Emergency,
}

impl Priority {
    /// Returns `true` for [`Priority::Emergency`].
    #[inline]
    pub fn is_emergency(&self) -> bool {
        matches!(self, Priority::Emergency)
    }

    /// Stable label value for logs and metrics.
    #[inline]
    pub fn as_label(&self) -> &'static str {
        match self {
            Priority::Normal => "normal",
            Priority::Emergency => "emergency",
        }
    }
}

impl FromStr for Priority {
    type Err = ModelError;
    fn from_str(s: &str) -> ModelResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "normal" | "regular" | "" => Ok(Priority::Normal),
            "emergency" | "priority" => Ok(Priority::Emergency),
            other => Err(ModelError::UnknownPriority(other.to_string())),
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_label())
    }
}
