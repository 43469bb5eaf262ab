use std::{
    fmt,
    str::FromStr,
    sync::{OnceLock, RwLock},
};

use serde::{Deserialize, Serialize};
use time::UtcOffset;

use crate::logger::error::LoggerError;

/// Cached local UTC offset; written by [`init_local_offset`] or lazily on first use.
static LOCAL_OFFSET: RwLock<UtcOffset> = RwLock::new(UtcOffset::UTC);

static DETECTED: OnceLock<()> = OnceLock::new();

/// Timezone for log timestamps.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LoggerTimeZone {
    #[default]
    Utc,
    Local,
}

impl FromStr for LoggerTimeZone {
    type Err = LoggerError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "utc" => Ok(Self::Utc),
            "local" => Ok(Self::Local),
            _ => Err(LoggerError::InvalidTimeZone(s.to_string())),
        }
    }
}

impl fmt::Display for LoggerTimeZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LoggerTimeZone::Utc => "utc",
            LoggerTimeZone::Local => "local",
        })
    }
}

/// Detect and cache the local offset.
///
/// Call from `main()` **before** the tokio runtime starts: offset detection refuses to run
/// once the process is multi-threaded on most Unix platforms. Falls back to UTC.
///
/// ```no_run
/// fn main() {
///     junction_observe::init_local_offset();
///     let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
///     rt.block_on(async { /* ... */ });
/// }
/// ```
pub fn init_local_offset() {
    let offset = UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC);
    if let Ok(mut guard) = LOCAL_OFFSET.write() {
        *guard = offset;
    }
    let _ = DETECTED.set(());
}

/// Cached local offset, detected on first call if [`init_local_offset`] never ran.
pub(crate) fn get_or_detect_local_offset() -> UtcOffset {
    DETECTED.get_or_init(|| match UtcOffset::current_local_offset() {
        Ok(detected) => {
            if let Ok(mut guard) = LOCAL_OFFSET.write() {
                *guard = detected;
            }
        }
        Err(_) => {
            eprintln!(
                "WARNING: junction-observe could not detect the local timezone; \
                 call init_local_offset() before starting the runtime. Using UTC."
            );
        }
    });

    LOCAL_OFFSET
        .read()
        .map(|guard| *guard)
        .unwrap_or(UtcOffset::UTC)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_utc() {
        assert_eq!(LoggerTimeZone::default(), LoggerTimeZone::Utc);
    }

    #[test]
    fn parses_case_insensitive() {
        assert_eq!("UTC".parse::<LoggerTimeZone>().unwrap(), LoggerTimeZone::Utc);
        assert_eq!(" local ".parse::<LoggerTimeZone>().unwrap(), LoggerTimeZone::Local);
        assert!("".parse::<LoggerTimeZone>().is_err());
        assert!("cet".parse::<LoggerTimeZone>().is_err());
    }

    #[test]
    fn serde_uses_lowercase_names() {
        assert_eq!(serde_json::to_string(&LoggerTimeZone::Local).unwrap(), r#""local""#);
        let tz: LoggerTimeZone = serde_json::from_str(r#""utc""#).unwrap();
        assert_eq!(tz, LoggerTimeZone::Utc);
    }

    #[test]
    fn cached_offset_is_sane_after_init() {
        init_local_offset();
        assert!(get_or_detect_local_offset().whole_hours().abs() <= 14);
    }
}
