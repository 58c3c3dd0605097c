//! A process-wide, hot-swappable structured logger with layered configuration.
//!
//! Logging calls go through a [`Facade`] that always holds exactly one [`Logger`]. The free
//! functions in this crate ([`info()`], [`error()`], ...) use the process-wide facade, which starts
//! out with a logger built from [`Options::default()`] and can be replaced at any time using
//! [`reconfigure()`].
//!
//! ```
//! use blog_log::{fields, Options};
//!
//! blog_log::info("starting", fields!["port" => 8080]);
//! blog_log::reconfigure(&Options {
//!     level: String::from("debug"),
//!     ..Options::default()
//! });
//! blog_log::debug("now visible", &[]);
//! blog_log::sync();
//! ```
//!
//! The options usually come from a [`ConfigResolver`], which reads a YAML file and lets
//! environment variables override individual keys. [`Command`] ties the two together.

mod builder;
pub mod command;
pub mod config;
mod encoder;
pub mod facade;
mod level;
mod logger;
mod options;
mod target;
mod value;

pub use builder::{BuildError, LoggerBuilder, OutputTarget};
pub use command::Command;
pub use config::{env_var_name, ConfigError, ConfigResolver, Conventions, Settings};
pub use encoder::{Caller, Format};
pub use facade::{debug, error, fatal, global, info, panic, reconfigure, sync, warn, Facade};
pub use level::{Level, ParseLevelError};
pub use logger::Logger;
pub use options::Options;
pub use value::{Field, Value};
