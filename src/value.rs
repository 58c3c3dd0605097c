//! Structured key-value fields attached to log records.

use std::borrow::Cow;
use std::fmt::Display;
use std::time::Duration;

/// A single key-value pair attached to a log record. Fields keep the order they were passed in.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub key: Cow<'static, str>,
    pub value: Value,
}

/// The value of a [`Field`].
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    String(String),
    Int(i64),
    Uint(u64),
    Float(f64),
    Bool(bool),
    /// Encoded as the number of elapsed milliseconds, as a float.
    Duration(Duration),
    /// An error's `Display` output. Use [`Value::error()`] to create these.
    Error(String),
}

impl Field {
    pub fn new(key: impl Into<Cow<'static, str>>, value: impl Into<Value>) -> Self {
        Field {
            key: key.into(),
            value: value.into(),
        }
    }
}

impl Value {
    /// Capture an error. The full source chain is included, separated by `: `.
    pub fn error(error: &(dyn std::error::Error + 'static)) -> Self {
        let mut message = error.to_string();
        let mut source = error.source();
        while let Some(cause) = source {
            message.push_str(": ");
            message.push_str(&cause.to_string());
            source = cause.source();
        }

        Value::Error(message)
    }

    /// Capture anything that implements `Display` as a string.
    pub fn display(value: impl Display) -> Self {
        Value::String(value.to_string())
    }

    /// The duration in milliseconds as used in the encoded output.
    pub fn duration_millis(duration: Duration) -> f64 {
        duration.as_nanos() as f64 / 1_000_000.0
    }

    /// Convert the value to its JSON representation.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::String(s) | Value::Error(s) => serde_json::Value::from(s.as_str()),
            Value::Int(n) => serde_json::Value::from(*n),
            Value::Uint(n) => serde_json::Value::from(*n),
            Value::Float(n) => serde_json::Value::from(*n),
            Value::Bool(b) => serde_json::Value::from(*b),
            Value::Duration(d) => serde_json::Value::from(Value::duration_millis(*d)),
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_owned())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<&String> for Value {
    fn from(value: &String) -> Self {
        Value::String(value.clone())
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<Duration> for Value {
    fn from(value: Duration) -> Self {
        Value::Duration(value)
    }
}

macro_rules! impl_from_number {
    ($variant:ident($target:ty) <- $($source:ty),+) => {
        $(
            impl From<$source> for Value {
                fn from(value: $source) -> Self {
                    Value::$variant(value as $target)
                }
            }
        )+
    };
}

impl_from_number!(Int(i64) <- i8, i16, i32, i64, isize);
impl_from_number!(Uint(u64) <- u8, u16, u32, u64, usize);
impl_from_number!(Float(f64) <- f32, f64);

/// Build a slice of [`Field`]s from `key => value` pairs, in order.
///
/// ```
/// use std::time::Duration;
///
/// blog_log::info(
///     "request served",
///     blog_log::fields![
///         "path" => "/healthz",
///         "status" => 200,
///         "took" => Duration::from_millis(3),
///     ],
/// );
/// ```
#[macro_export]
macro_rules! fields {
    ($($key:expr => $value:expr),* $(,)?) => {
        &[$($crate::Field::new($key, $value)),*]
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, thiserror::Error)]
    #[error("outer")]
    struct Outer(#[source] std::io::Error);

    #[test]
    fn error_includes_source_chain() {
        let error = Outer(std::io::Error::new(std::io::ErrorKind::Other, "inner"));
        assert_eq!(Value::error(&error), Value::Error(String::from("outer: inner")));
    }

    #[test]
    fn durations_are_fractional_milliseconds() {
        assert_eq!(
            Value::from(Duration::from_micros(1500)).to_json(),
            serde_json::json!(1.5)
        );
    }

    #[test]
    fn fields_macro_keeps_order() {
        let fields: &[Field] = crate::fields!["b" => 1, "a" => "x", "c" => true];
        let keys: Vec<&str> = fields.iter().map(|f| f.key.as_ref()).collect();
        assert_eq!(keys, ["b", "a", "c"]);
        assert_eq!(fields[0].value, Value::Int(1));
        assert_eq!(fields[2].value, Value::Bool(true));
    }
}
