//! Structured logger trait
//!
//! [`Logger`] is the interface plugin hosts log through. Implementations
//! decide where records go; the trait only fixes how callers attach fields
//! and pick a level.

use crate::error::PluginError;
use crate::level::Level;
use std::collections::BTreeMap;
use std::fmt;

/// Key/value pairs attached to every record a logger emits
pub type Fields = BTreeMap<String, serde_json::Value>;

/// Options shared by every logger implementation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoggerOptions {
    /// Minimum level that is emitted
    pub level: Level,
    /// Static fields attached to every record
    pub fields: Fields,
}

impl LoggerOptions {
    /// Options at the given level with no static fields
    pub fn with_level(level: Level) -> Self {
        Self {
            level,
            fields: Fields::new(),
        }
    }

    /// Add a static field
    pub fn field(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }
}

/// Logger trait - leveled, structured record emission
///
/// `log` takes pre-captured [`fmt::Arguments`], which covers both plain and
/// formatted messages:
///
/// ```ignore
/// logger.log(Level::Info, format_args!("listening on {}", addr));
/// logger.info(format_args!("ready"));
/// ```
pub trait Logger: Send + Sync {
    /// Re-initialize with new options
    fn init(&mut self, options: LoggerOptions) -> Result<(), PluginError>;

    /// Current options
    fn options(&self) -> &LoggerOptions;

    /// Child logger carrying `fields` in addition to this logger's fields
    ///
    /// The receiver is left unchanged.
    fn fields(&self, fields: Fields) -> Box<dyn Logger>;

    /// Child logger carrying an `error` field
    fn with_error(&self, err: &dyn std::error::Error) -> Box<dyn Logger> {
        let mut fields = Fields::new();
        fields.insert(
            "error".to_string(),
            serde_json::Value::String(err.to_string()),
        );
        self.fields(fields)
    }

    /// Emit a record at `level`
    fn log(&self, level: Level, args: fmt::Arguments<'_>);

    /// Implementation name
    fn name(&self) -> &'static str;

    /// Emit at [`Level::Trace`]
    fn trace(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Trace, args);
    }

    /// Emit at [`Level::Debug`]
    fn debug(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Debug, args);
    }

    /// Emit at [`Level::Info`]
    fn info(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Info, args);
    }

    /// Emit at [`Level::Warn`]
    fn warn(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Warn, args);
    }

    /// Emit at [`Level::Error`]
    fn error(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Error, args);
    }

    /// Emit at [`Level::Fatal`]
    ///
    /// Only emits; terminating the process is left to the caller.
    fn fatal(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Fatal, args);
    }
}
