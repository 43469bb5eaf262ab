mod config;
mod error;
mod init;
mod object;

pub use config::{LOG_ENV_VAR, LOG_FORMAT_ENV_VAR, LoggerConfig};
pub use error::{LoggerError, LoggerResult};
pub use object::{LoggerFormat, LoggerLevel, LoggerRfc3339, LoggerTimeZone, init_local_offset};

/// Installs the global tracing subscriber described by `cfg`.
///
/// After this call every `tracing` macro in the controller (phase changes, releases,
/// observer failures) goes through the configured format and filter.
///
/// # Local timezone
/// With `LoggerTimeZone::Local`, call [`init_local_offset`] in `main()` before the tokio
/// runtime starts: offset detection is unreliable once other threads exist.
///
/// # Examples
/// ```rust
/// use junction_observe::{LoggerConfig, init_logger};
///
/// let config = LoggerConfig::default();
/// init_logger(&config).expect("logger initializes once");
/// tracing::info!("logger ready");
/// ```
pub fn init_logger(cfg: &LoggerConfig) -> LoggerResult<()> {
    match cfg.format {
        LoggerFormat::Text => init::logger_text(cfg),
        LoggerFormat::Json => init::logger_json(cfg),
        LoggerFormat::Journald => init::logger_journald(cfg),
    }
}
