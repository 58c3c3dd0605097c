//! Turns log records into bytes.

use std::borrow::Cow;
use std::fmt::Display;
use std::io;
use std::panic::Location;
use std::str::FromStr;

use serde_json::Value as JsonValue;
use termcolor::{Color, ColorSpec, WriteColor};
use time::macros::format_description;
use time::OffsetDateTime;

use crate::{Field, Level};

/// The keys a JSON record uses for its own values. Fields with one of these keys are written as
/// `fields.<key>` instead.
const RECORD_KEYS: [&str; 5] = ["level", "timestamp", "caller", "message", "stacktrace"];

/// How records are encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// Tab separated, human readable records. Fields are appended as a JSON object.
    Console,
    /// One JSON object per line.
    Json,
}

impl FromStr for Format {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "console" => Ok(Format::Console),
            "json" => Ok(Format::Json),
            _ => Err(s.to_owned()),
        }
    }
}

/// The source location of a logging call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller {
    pub file: &'static str,
    pub line: u32,
}

impl From<&'static Location<'static>> for Caller {
    fn from(location: &'static Location<'static>) -> Self {
        Caller {
            file: location.file(),
            line: location.line(),
        }
    }
}

impl Display for Caller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

/// A single log record, ready to be encoded.
#[derive(Debug)]
pub struct Record<'a> {
    pub timestamp: OffsetDateTime,
    pub level: Level,
    pub caller: Option<Caller>,
    pub message: &'a str,
    pub fields: &'a [Field],
    pub stacktrace: Option<&'a str>,
}

impl Format {
    /// Write `record` followed by a line feed. Colors are only used by the console format, and only
    /// if the writer supports them.
    pub fn encode(self, record: &Record, writer: &mut dyn WriteColor) -> io::Result<()> {
        // `2006-01-02 15:04:05.000`, millisecond precision
        let timestamp = record
            .timestamp
            .format(format_description!(
                "[year]-[month]-[day] [hour]:[minute]:[second].[subsecond digits:3]"
            ))
            .map_err(|err| io::Error::new(io::ErrorKind::Other, err))?;

        match self {
            Format::Console => {
                write!(writer, "{timestamp}\t")?;
                writer.set_color(&level_color(record.level))?;
                write!(writer, "{}", record.level)?;
                writer.reset()?;
                if let Some(caller) = record.caller {
                    write!(writer, "\t{caller}")?;
                }
                write!(writer, "\t{}", record.message)?;
                if !record.fields.is_empty() {
                    write!(writer, "\t{{")?;
                    let mut first = true;
                    for field in record.fields {
                        write_entry(writer, &mut first, &field.key, &field.value.to_json())?;
                    }
                    write!(writer, "}}")?;
                }
                writeln!(writer)?;
                if let Some(stacktrace) = record.stacktrace {
                    writeln!(writer, "{}", stacktrace.trim_end())?;
                }
            }
            Format::Json => {
                let mut first = true;
                write!(writer, "{{")?;
                write_entry(writer, &mut first, "level", &record.level.as_str().into())?;
                write_entry(writer, &mut first, "timestamp", &timestamp.into())?;
                if let Some(caller) = record.caller {
                    write_entry(writer, &mut first, "caller", &caller.to_string().into())?;
                }
                write_entry(writer, &mut first, "message", &record.message.into())?;
                for field in record.fields {
                    let key = field_key(&field.key);
                    write_entry(writer, &mut first, &key, &field.value.to_json())?;
                }
                if let Some(stacktrace) = record.stacktrace {
                    write_entry(writer, &mut first, "stacktrace", &stacktrace.into())?;
                }
                writeln!(writer, "}}")?;
            }
        }

        Ok(())
    }
}

/// Write one `"key":value` pair of a JSON object. Objects are written by hand so repeated keys are
/// all kept in their original order.
fn write_entry(
    writer: &mut dyn WriteColor,
    first: &mut bool,
    key: &str,
    value: &JsonValue,
) -> io::Result<()> {
    if !std::mem::take(first) {
        write!(writer, ",")?;
    }
    serde_json::to_writer(&mut *writer, key)?;
    write!(writer, ":")?;
    serde_json::to_writer(&mut *writer, value)?;

    Ok(())
}

fn field_key(key: &str) -> Cow<'_, str> {
    if RECORD_KEYS.contains(&key) {
        Cow::Owned(format!("fields.{key}"))
    } else {
        Cow::Borrowed(key)
    }
}

fn level_color(level: Level) -> ColorSpec {
    let mut spec = ColorSpec::new();
    match level {
        Level::Debug => spec.set_fg(Some(Color::Magenta)),
        Level::Info => spec.set_fg(Some(Color::Blue)),
        Level::Warn => spec.set_fg(Some(Color::Yellow)),
        Level::Error => spec.set_fg(Some(Color::Red)),
        Level::Panic | Level::Fatal => spec.set_fg(Some(Color::Red)).set_bold(true),
    };

    spec
}
