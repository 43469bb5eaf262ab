use serde::{Deserialize, Serialize};
use std::io::IsTerminal;

use crate::logger::{
    error::LoggerResult,
    object::{LoggerFormat, LoggerLevel, LoggerTimeZone},
};

/// Environment variable overriding [`LoggerConfig::level`].
pub const LOG_ENV_VAR: &str = "JUNCTION_LOG";

/// Environment variable overriding [`LoggerConfig::format`].
pub const LOG_FORMAT_ENV_VAR: &str = "JUNCTION_LOG_FORMAT";

/// Logger configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LoggerConfig {
    /// Output format.
    pub format: LoggerFormat,
    /// Filter expression (e.g. `"info"`, `"junction_core=debug,info"`).
    pub level: LoggerLevel,
    /// Timezone for timestamps.
    pub tz: LoggerTimeZone,
    /// Whether to include module/target names in log output.
    pub with_targets: bool,
    /// Whether to use colored output (text format, terminals only).
    pub use_color: bool,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            format: LoggerFormat::default(),
            level: LoggerLevel::default(),
            tz: LoggerTimeZone::default(),
            with_targets: true,
            use_color: true,
        }
    }
}

impl LoggerConfig {
    /// Color is used only when enabled in config AND stdout is a terminal.
    ///
    /// Evaluated at logger initialization, not at config parsing.
    pub fn should_use_color(&self) -> bool {
        self.use_color && std::io::stdout().is_terminal()
    }

    /// Apply `JUNCTION_LOG` / `JUNCTION_LOG_FORMAT` on top of this config.
    pub fn with_env_overrides(self) -> LoggerResult<Self> {
        let level = std::env::var(LOG_ENV_VAR).ok();
        let format = std::env::var(LOG_FORMAT_ENV_VAR).ok();
        self.with_overrides(level.as_deref(), format.as_deref())
    }

    /// Replace level and/or format from raw strings; `None` keeps the current value.
    pub fn with_overrides(mut self, level: Option<&str>, format: Option<&str>) -> LoggerResult<Self> {
        if let Some(level) = level {
            self.level = level.parse()?;
        }
        if let Some(format) = format {
            self.format = format.parse()?;
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logger::LoggerError;

    #[test]
    fn default_values() {
        let config = LoggerConfig::default();

        assert_eq!(config.format, LoggerFormat::Text);
        assert_eq!(config.tz, LoggerTimeZone::Utc);
        assert_eq!(config.level.as_str(), "info");
        assert!(config.with_targets);
        assert!(config.use_color);
    }

    #[test]
    fn camel_case_fields_with_defaults() {
        let json = r#"{"format": "json", "withTargets": false}"#;
        let config: LoggerConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.format, LoggerFormat::Json);
        assert!(!config.with_targets);
        assert_eq!(config.level.as_str(), "info");
        assert!(config.use_color);
    }

    #[test]
    fn overrides_replace_only_given_values() {
        let config = LoggerConfig::default()
            .with_overrides(Some("junction_core=trace,warn"), None)
            .unwrap();

        assert_eq!(config.level.as_str(), "junction_core=trace,warn");
        assert_eq!(config.format, LoggerFormat::Text);

        let config = config.with_overrides(None, Some("JSON")).unwrap();
        assert_eq!(config.format, LoggerFormat::Json);
        assert_eq!(config.level.as_str(), "junction_core=trace,warn");
    }

    #[test]
    fn invalid_override_is_reported() {
        let err = LoggerConfig::default()
            .with_overrides(None, Some("xml"))
            .unwrap_err();
        assert!(matches!(err, LoggerError::InvalidFormat(_)));

        let err = LoggerConfig::default()
            .with_overrides(Some("junction_core=loud"), None)
            .unwrap_err();
        assert!(matches!(err, LoggerError::InvalidLevel(_)));
    }
}
