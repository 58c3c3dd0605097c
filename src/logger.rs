//! The logger implementation itself. Construct one using the
//! [`LoggerBuilder`][crate::LoggerBuilder].

use std::backtrace::Backtrace;
use std::io;
use std::panic::Location;
use std::sync::{Mutex, PoisonError};

use termcolor::{Buffer, WriteColor};
use time::{OffsetDateTime, UtcOffset};

use crate::encoder::{Caller, Format, Record};
use crate::target::OutputTargetImpl;
use crate::{Field, Level};

/// A configured logger instance. Usually accessed through the [`Facade`][crate::Facade] instead of
/// directly.
#[derive(Debug)]
pub struct Logger {
    /// Records below this level are discarded.
    pub(crate) level: Level,
    pub(crate) format: Format,
    pub(crate) disable_caller: bool,
    /// Records at or above this level include a stack trace.
    pub(crate) stacktrace_level: Level,
    /// Determined once when the logger is built. Querying the local offset is unreliable once
    /// other threads are running.
    pub(crate) local_offset: UtcOffset,
    /// Every record is written to all of these targets in order.
    pub(crate) targets: Mutex<Vec<OutputTargetImpl>>,
}

impl Logger {
    /// The minimum level of records that are written.
    pub fn level(&self) -> Level {
        self.level
    }

    pub fn enabled(&self, level: Level) -> bool {
        level >= self.level
    }

    #[track_caller]
    pub fn debug(&self, message: &str, fields: &[Field]) {
        self.log(Level::Debug, message, fields, Some(Location::caller().into()));
    }

    #[track_caller]
    pub fn info(&self, message: &str, fields: &[Field]) {
        self.log(Level::Info, message, fields, Some(Location::caller().into()));
    }

    #[track_caller]
    pub fn warn(&self, message: &str, fields: &[Field]) {
        self.log(Level::Warn, message, fields, Some(Location::caller().into()));
    }

    #[track_caller]
    pub fn error(&self, message: &str, fields: &[Field]) {
        self.log(Level::Error, message, fields, Some(Location::caller().into()));
    }

    /// Write the record with a stack trace, and then panic with `message`. The process keeps
    /// running if the panic is caught.
    #[track_caller]
    pub fn panic(&self, message: &str, fields: &[Field]) -> ! {
        self.log(Level::Panic, message, fields, Some(Location::caller().into()));

        panic!("{message}");
    }

    /// Write the record with a stack trace, flush every target, and then terminate the process with
    /// exit code 1.
    #[track_caller]
    pub fn fatal(&self, message: &str, fields: &[Field]) -> ! {
        self.log(Level::Fatal, message, fields, Some(Location::caller().into()));
        let _ = self.sync();

        std::process::exit(1);
    }

    /// Write a record at `level` attributed to `caller`. This never panics or exits, regardless of
    /// the level.
    pub fn log(&self, level: Level, message: &str, fields: &[Field], caller: Option<Caller>) {
        if !self.enabled(level) {
            return;
        }

        let stacktrace =
            (level >= self.stacktrace_level).then(|| Backtrace::force_capture().to_string());
        let record = Record {
            timestamp: OffsetDateTime::now_utc().to_offset(self.local_offset),
            level,
            caller: if self.disable_caller { None } else { caller },
            message,
            fields,
            stacktrace: stacktrace.as_deref(),
        };

        // Writing a record may not fail the caller, errors are the target's problem. Records are
        // encoded up front so each one reaches the target in a single write.
        let mut targets = self.targets.lock().unwrap_or_else(PoisonError::into_inner);
        for target in targets.iter_mut() {
            let writer = target.writer();
            let mut buffer = if writer.supports_color() {
                Buffer::ansi()
            } else {
                Buffer::no_color()
            };
            if self.format.encode(&record, &mut buffer).is_ok() {
                let _ = writer.write_all(buffer.as_slice());
            }
            if target.flush_per_record() || level >= Level::Panic {
                let _ = target.flush();
            }
        }
    }

    /// Flush all buffered output. Calling this repeatedly is harmless. Every target is flushed even
    /// if an earlier one fails, the first error is returned.
    pub fn sync(&self) -> io::Result<()> {
        let mut targets = self.targets.lock().unwrap_or_else(PoisonError::into_inner);
        let mut result = Ok(());
        for target in targets.iter_mut() {
            if let Err(err) = target.flush() {
                if result.is_ok() {
                    result = Err(err);
                }
            }
        }

        result
    }
}
