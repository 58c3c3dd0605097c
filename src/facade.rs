//! The process-wide logging facade.
//!
//! A [`Facade`] owns a slot containing the current [`Logger`]. Every logging call loads whatever
//! logger is in the slot at that moment, and [`Facade::reconfigure()`] atomically replaces it. The
//! slot is filled when the facade is created, so it can never be observed empty.
//!
//! Most code doesn't hold a facade at all and uses the free functions in this module instead.
//! These forward to the process-wide instance returned by [`global()`], which starts out with a
//! logger built from [`Options::default()`] the first time it's used.

use arc_swap::ArcSwap;
use log::{LevelFilter, SetLoggerError};
use once_cell::sync::{Lazy, OnceCell};
use std::sync::{Arc, Mutex, PoisonError};

use crate::builder::BuildError;
use crate::encoder::Caller;
use crate::logger::Logger;
use crate::{Field, LoggerBuilder, Options};

/// The process-wide facade. Initialized on first use.
static GLOBAL: Lazy<Facade> = Lazy::new(|| Facade::new(&Options::default()));

/// Set once the global facade has been registered with the `log` crate.
static LOG_BACKEND: OnceCell<()> = OnceCell::new();

/// A replaceable logger. See the [module documentation][self].
#[derive(Debug)]
pub struct Facade {
    current: ArcSwap<Logger>,
    /// Serializes replacements so the previous logger's final sync happens in swap order.
    swap_lock: Mutex<()>,
}

/// The process-wide facade.
pub fn global() -> &'static Facade {
    &GLOBAL
}

/// Register the global facade as the `log` crate's logger so `log::info!()` and friends end up in
/// the current logger. Calling this more than once is fine. Fails if some other logger was already
/// registered with the `log` crate.
pub fn install_log_backend() -> Result<(), SetLoggerError> {
    LOG_BACKEND
        .get_or_try_init(|| {
            log::set_logger(global())?;
            // The current logger does the actual filtering, and that can change at any time
            log::set_max_level(LevelFilter::Trace);

            Ok(())
        })
        .map(|_| ())
}

impl Facade {
    /// Create a facade holding a logger built from `options`. Terminates the process if the logger
    /// can't be built.
    pub fn new(options: &Options) -> Self {
        Self::with_logger(LoggerBuilder::new(options.clone()).build_or_abort())
    }

    pub fn with_logger(logger: Logger) -> Self {
        Self {
            current: ArcSwap::from_pointee(logger),
            swap_lock: Mutex::new(()),
        }
    }

    /// The currently installed logger. Holding on to this keeps that logger alive even after it
    /// has been replaced.
    pub fn current(&self) -> Arc<Logger> {
        self.current.load_full()
    }

    /// Replace the current logger with one built from `options`. Terminates the process if the
    /// logger can't be built. Concurrent calls are fine, the last one to swap wins.
    pub fn reconfigure(&self, options: &Options) {
        self.install(LoggerBuilder::new(options.clone()).build_or_abort());
    }

    /// Like [`reconfigure()`][Self::reconfigure()], but leaves the current logger in place and
    /// returns the error if the new one can't be built.
    pub fn try_reconfigure(&self, options: &Options) -> Result<(), BuildError> {
        self.install(LoggerBuilder::new(options.clone()).build()?);

        Ok(())
    }

    /// Swap in `logger`. The replaced logger is synced, and it's dropped once the last in-flight
    /// logging call using it has finished.
    pub fn install(&self, logger: Logger) {
        let _guard = self.swap_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let previous = self.current.swap(Arc::new(logger));
        let _ = previous.sync();
    }

    #[track_caller]
    pub fn debug(&self, message: &str, fields: &[Field]) {
        self.current.load().debug(message, fields);
    }

    #[track_caller]
    pub fn info(&self, message: &str, fields: &[Field]) {
        self.current.load().info(message, fields);
    }

    #[track_caller]
    pub fn warn(&self, message: &str, fields: &[Field]) {
        self.current.load().warn(message, fields);
    }

    #[track_caller]
    pub fn error(&self, message: &str, fields: &[Field]) {
        self.current.load().error(message, fields);
    }

    /// See [`Logger::panic()`].
    #[track_caller]
    pub fn panic(&self, message: &str, fields: &[Field]) -> ! {
        // Owned handle, the panic unwinds through this frame
        let logger = self.current.load_full();
        logger.panic(message, fields)
    }

    /// See [`Logger::fatal()`].
    #[track_caller]
    pub fn fatal(&self, message: &str, fields: &[Field]) -> ! {
        let logger = self.current.load_full();
        logger.fatal(message, fields)
    }

    /// Flush the current logger. Errors from the underlying targets are ignored.
    pub fn sync(&self) {
        let _ = self.current.load().sync();
    }
}

impl log::Log for Facade {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        self.current.load().enabled(metadata.level().into())
    }

    fn log(&self, record: &log::Record) {
        let caller = record
            .file_static()
            .zip(record.line())
            .map(|(file, line)| Caller { file, line });
        let message = match record.args().as_str() {
            Some(message) => std::borrow::Cow::Borrowed(message),
            None => std::borrow::Cow::Owned(record.args().to_string()),
        };

        self.current
            .load()
            .log(record.level().into(), &message, &[], caller);
    }

    fn flush(&self) {
        self.sync();
    }
}

/// Log at the debug level using the global facade.
#[track_caller]
pub fn debug(message: &str, fields: &[Field]) {
    global().debug(message, fields);
}

/// Log at the info level using the global facade.
#[track_caller]
pub fn info(message: &str, fields: &[Field]) {
    global().info(message, fields);
}

/// Log at the warn level using the global facade.
#[track_caller]
pub fn warn(message: &str, fields: &[Field]) {
    global().warn(message, fields);
}

/// Log at the error level using the global facade.
#[track_caller]
pub fn error(message: &str, fields: &[Field]) {
    global().error(message, fields);
}

/// Log at the panic level using the global facade, then panic.
#[track_caller]
pub fn panic(message: &str, fields: &[Field]) -> ! {
    global().panic(message, fields)
}

/// Log at the fatal level using the global facade, flush, then exit with code 1.
#[track_caller]
pub fn fatal(message: &str, fields: &[Field]) -> ! {
    global().fatal(message, fields)
}

/// Flush the global logger. Call this before the process exits.
pub fn sync() {
    global().sync();
}

/// Replace the global logger. See [`Facade::reconfigure()`].
pub fn reconfigure(options: &Options) {
    global().reconfigure(options);
}
