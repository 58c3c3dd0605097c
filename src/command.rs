//! Shared start-up for the service's commands.

use std::path::PathBuf;

use crate::config::{ConfigError, ConfigResolver, Conventions, Settings};
use crate::{fields, LoggerBuilder, Options, Value};

/// Resolves configuration, installs the configured logger, runs a service, and flushes the logger
/// afterwards. Every command variant goes through this, only the service differs.
#[derive(Debug, Clone, Default)]
pub struct Command {
    resolver: ConfigResolver,
}

impl Command {
    pub fn new(conventions: Conventions) -> Self {
        Self {
            resolver: ConfigResolver::new(conventions),
        }
    }

    /// Read configuration from this file instead of searching the default locations.
    pub fn with_config_file(mut self, path: Option<PathBuf>) -> Self {
        self.resolver = self.resolver.with_config_file(path);
        self
    }

    /// Search this home directory instead of the current user's. See
    /// [`ConfigResolver::with_home_dir()`].
    pub fn with_home_dir(mut self, home_dir: Option<PathBuf>) -> Self {
        self.resolver = self.resolver.with_home_dir(home_dir);
        self
    }

    /// Run `service` with the resolved settings. Returns early without installing a logger if the
    /// configuration can't be resolved at all. The global logger is synced after the service
    /// returns, regardless of its result.
    pub fn run<F, E>(self, service: F) -> Result<(), E>
    where
        F: FnOnce(&Settings) -> Result<(), E>,
        E: From<ConfigError>,
    {
        let settings = self.resolver.resolve()?;

        if let Err(err) = LoggerBuilder::new(Options::from_settings(&settings)).build_global() {
            crate::warn(
                "another logger is registered with the log crate, its records won't be captured",
                fields!["err" => Value::error(&err)],
            );
        }

        let result = service(&settings);
        crate::sync();

        result
    }
}
