//! The options a logger is built from.

use crate::config::Settings;

/// The configuration key for [`Options::level`].
pub const LEVEL_KEY: &str = "log.level";
/// The configuration key for [`Options::format`].
pub const FORMAT_KEY: &str = "log.format";
/// The configuration key for [`Options::disable_caller`].
pub const DISABLE_CALLER_KEY: &str = "log.disable-caller";
/// The configuration key for [`Options::disable_stacktrace`].
pub const DISABLE_STACKTRACE_KEY: &str = "log.disable-stacktrace";
/// The configuration key for [`Options::output_paths`].
pub const OUTPUT_PATHS_KEY: &str = "log.output-paths";

/// Describes how a logger should behave. Turned into a logger using
/// [`LoggerBuilder`][crate::LoggerBuilder].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    /// The minimum level name. Names that can't be parsed result in `info`.
    pub level: String,
    /// Either `console` or `json`. Anything else is rejected when the logger is built.
    pub format: String,
    /// Omit the `file:line` of the logging call from records.
    pub disable_caller: bool,
    /// Only capture stack traces for `panic` and `fatal` records instead of for everything at
    /// `error` and above.
    pub disable_stacktrace: bool,
    /// `stdout`, `stderr`, or a file path. Records are written to every destination in order. An
    /// empty list results in a logger that discards everything.
    pub output_paths: Vec<String>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            level: String::from("info"),
            format: String::from("console"),
            disable_caller: false,
            disable_stacktrace: false,
            output_paths: vec![String::from("stdout")],
        }
    }
}

impl Options {
    /// Derive the options from resolved settings. Keys that aren't set anywhere keep their default
    /// value. An explicitly configured empty list of output paths is kept as is.
    pub fn from_settings(settings: &Settings) -> Self {
        let defaults = Options::default();

        let level = settings.get_string(LEVEL_KEY);
        let format = settings.get_string(FORMAT_KEY);
        let output_paths = if settings.is_set(OUTPUT_PATHS_KEY) {
            settings.get_string_list(OUTPUT_PATHS_KEY)
        } else {
            defaults.output_paths
        };

        Self {
            level: if level.is_empty() { defaults.level } else { level },
            format: if format.is_empty() { defaults.format } else { format },
            disable_caller: settings.get_bool(DISABLE_CALLER_KEY),
            disable_stacktrace: settings.get_bool(DISABLE_STACKTRACE_KEY),
            output_paths,
        }
    }
}
