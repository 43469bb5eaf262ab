use std::{fs, path::Path, time::Duration};

use anyhow::Context;
use serde::{Deserialize, Serialize};

use junction_model::ControllerConfig;
use junction_observe::LoggerConfig;

/// Daemon configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AgentConfig {
    pub logger: LoggerConfig,
    pub controller: ControllerConfig,
    pub arrivals: ArrivalsConfig,
}

/// Synthetic traffic fed into the controller.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ArrivalsConfig {
    /// Pause between two arrivals; `0` disables the generator.
    pub interval_ms: u64,
    /// Every n-th arrival is an emergency unit; `0` means never.
    pub emergency_every: u64,
    /// Period of the queue snapshot log; `0` disables it.
    pub snapshot_ms: u64,
}

impl Default for ArrivalsConfig {
    fn default() -> Self {
        Self {
            interval_ms: 700,
            emergency_every: 5,
            snapshot_ms: 2_000,
        }
    }
}

impl ArrivalsConfig {
    pub fn interval(&self) -> Option<Duration> {
        (self.interval_ms > 0).then(|| Duration::from_millis(self.interval_ms))
    }

    pub fn snapshot_period(&self) -> Option<Duration> {
        (self.snapshot_ms > 0).then(|| Duration::from_millis(self.snapshot_ms))
    }
}

impl AgentConfig {
    /// Read the config from `path`, or use defaults when no path is given.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let raw = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let cfg: Self = serde_json::from_str(&raw)
            .with_context(|| format!("parsing config {}", path.display()))?;
        cfg.controller
            .validate()
            .with_context(|| format!("invalid controller config in {}", path.display()))?;
        Ok(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use junction_model::{ClockMode, DEFAULT_OPEN_MS, Phase};
    use junction_observe::LoggerFormat;

    #[test]
    fn empty_document_uses_defaults() {
        let cfg: AgentConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg.controller.open_ms, DEFAULT_OPEN_MS);
        assert_eq!(cfg.arrivals.emergency_every, 5);
        assert_eq!(cfg.logger.format, LoggerFormat::Text);
    }

    #[test]
    fn nested_sections_parse() {
        let json = r#"{
            "logger": { "format": "json", "level": "junction_core=debug,info" },
            "controller": { "openMs": 4000, "clockMode": "manual", "initialPhase": "closed" },
            "arrivals": { "intervalMs": 0, "emergencyEvery": 3 }
        }"#;
        let cfg: AgentConfig = serde_json::from_str(json).unwrap();

        assert_eq!(cfg.logger.format, LoggerFormat::Json);
        assert_eq!(cfg.controller.open_ms, 4_000);
        assert_eq!(cfg.controller.clock_mode, ClockMode::Manual);
        assert_eq!(cfg.controller.initial_phase, Phase::Closed);
        assert!(cfg.arrivals.interval().is_none());
        assert_eq!(cfg.arrivals.snapshot_period(), Some(Duration::from_secs(2)));
    }

    #[test]
    fn load_without_path_is_default() {
        let cfg = AgentConfig::load(None).unwrap();
        assert_eq!(cfg.controller.poll_ms, 1_000);
    }

    #[test]
    fn load_rejects_zero_durations() {
        let path = std::env::temp_dir().join(format!("junction-agentd-{}.json", std::process::id()));
        fs::write(&path, r#"{ "controller": { "pollMs": 0 } }"#).unwrap();

        let err = AgentConfig::load(Some(&path)).unwrap_err();
        fs::remove_file(&path).ok();
        assert!(format!("{err:#}").contains("pollMs"), "{err:#}");
    }
}
