//! Severity levels.

use std::fmt::Display;
use std::str::FromStr;

/// The severity of a log record, ordered from least to most severe.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Level {
    Debug,
    #[default]
    Info,
    Warn,
    Error,
    /// Written, then unwinds the calling thread.
    Panic,
    /// Written and flushed, then terminates the process.
    Fatal,
}

/// Returned by [`Level::from_str()`] when the name doesn't match any known level.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unrecognized level: {0:?}")]
pub struct ParseLevelError(pub String);

impl Level {
    /// All levels, from least to most severe.
    pub const ALL: [Level; 6] = [
        Level::Debug,
        Level::Info,
        Level::Warn,
        Level::Error,
        Level::Panic,
        Level::Fatal,
    ];

    /// The lower case name used in log output.
    pub const fn as_str(self) -> &'static str {
        match self {
            Level::Debug => "debug",
            Level::Info => "info",
            Level::Warn => "warn",
            Level::Error => "error",
            Level::Panic => "panic",
            Level::Fatal => "fatal",
        }
    }

    /// Parse a level name, falling back to [`Level::Info`] for anything that isn't recognized. An
    /// empty string also results in `Info`.
    pub fn parse_or_info(name: &str) -> Level {
        name.parse().unwrap_or(Level::Info)
    }
}

impl Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Level {
    type Err = ParseLevelError;

    /// Matching is case sensitive. Only the all lower case and the all upper case spellings are
    /// accepted, so `DEBUG` parses but `Debug` does not.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "debug" | "DEBUG" => Ok(Level::Debug),
            "info" | "INFO" => Ok(Level::Info),
            "warn" | "WARN" => Ok(Level::Warn),
            "error" | "ERROR" => Ok(Level::Error),
            "panic" | "PANIC" => Ok(Level::Panic),
            "fatal" | "FATAL" => Ok(Level::Fatal),
            _ => Err(ParseLevelError(s.to_owned())),
        }
    }
}

impl From<log::Level> for Level {
    fn from(value: log::Level) -> Self {
        match value {
            log::Level::Error => Level::Error,
            log::Level::Warn => Level::Warn,
            log::Level::Info => Level::Info,
            log::Level::Debug | log::Level::Trace => Level::Debug,
        }
    }
}
