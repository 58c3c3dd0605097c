//! A builder interface for the logger.

use log::SetLoggerError;
use std::path::PathBuf;
use std::sync::Mutex;
use time::UtcOffset;

use crate::encoder::Format;
use crate::logger::Logger;
use crate::target::OutputTargetImpl;
use crate::{facade, Level, Options};

/// Constructs a [`Logger`] from [`Options`].
#[derive(Debug, Clone, Default)]
pub struct LoggerBuilder {
    options: Options,
}

/// A parsed output path. `stdout` and `stderr` refer to the standard streams, anything else is
/// treated as a file path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputTarget {
    /// Write to STDOUT.
    Stdout,
    /// Write to STDERR.
    Stderr,
    /// Append to a file.
    File(PathBuf),
}

/// An error raised while building a logger.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("unknown log format '{0}', expected 'console' or 'json'")]
    UnknownFormat(String),
    #[error("could not open '{}'", path.display())]
    FileOpenError {
        path: PathBuf,
        #[source]
        error: std::io::Error,
    },
}

impl From<&str> for OutputTarget {
    fn from(path: &str) -> Self {
        match path {
            "stdout" => OutputTarget::Stdout,
            "stderr" => OutputTarget::Stderr,
            path => OutputTarget::File(PathBuf::from(path)),
        }
    }
}

impl LoggerBuilder {
    pub fn new(options: Options) -> Self {
        Self { options }
    }

    /// Build the logger. Fails if the format isn't known or if one of the output files can't be
    /// opened. An unknown level isn't an error, that results in the `info` level instead.
    pub fn build(&self) -> Result<Logger, BuildError> {
        let options = &self.options;
        let format: Format = options
            .format
            .parse()
            .map_err(BuildError::UnknownFormat)?;

        let targets = options
            .output_paths
            .iter()
            .map(|path| match OutputTarget::from(path.as_str()) {
                OutputTarget::Stdout => Ok(OutputTargetImpl::new_stdout()),
                OutputTarget::Stderr => Ok(OutputTargetImpl::new_stderr()),
                OutputTarget::File(path) => OutputTargetImpl::new_file_path(&path)
                    .map_err(|error| BuildError::FileOpenError { path, error }),
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Logger {
            level: Level::parse_or_info(&options.level),
            format,
            disable_caller: options.disable_caller,
            // Panics and fatal errors always get a stack trace
            stacktrace_level: if options.disable_stacktrace {
                Level::Panic
            } else {
                Level::Error
            },
            local_offset: UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC),
            targets: Mutex::new(targets),
        })
    }

    /// Build the logger, or terminate the process if that's not possible. Nothing else should run
    /// without working logging.
    pub fn build_or_abort(&self) -> Logger {
        match self.build() {
            Ok(logger) => logger,
            Err(err) => {
                match std::error::Error::source(&err) {
                    Some(source) => eprintln!("Could not build the logger: {err}: {source}"),
                    None => eprintln!("Could not build the logger: {err}"),
                }

                std::process::exit(1);
            }
        }
    }

    /// Install the configured logger as the global logger, replacing the current one, and route
    /// records from the `log` crate through it. Terminates the process if the logger cannot be
    /// built. Returns an error if some other `log` crate backend was already installed, in which
    /// case the global logger has still been replaced.
    pub fn build_global(self) -> Result<(), SetLoggerError> {
        facade::global().install(self.build_or_abort());

        facade::install_log_backend()
    }
}
