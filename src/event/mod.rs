//! The structured log event consumed by the sink.
//!
//! Events are produced elsewhere and only read here: a timestamp, a level, the message template
//! the event was written with, an optional exception and an ordered set of named properties.

use std::fmt;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;

mod template;
mod value;

pub use template::MessageTemplate;
pub use value::{PropertyValue, ScalarValue, StructureValue};

use crate::format::FormatProvider;

/// Severity of a log event, lowest first.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Level {
    Verbose,
    Debug,
    Information,
    Warning,
    Error,
    Fatal,
}

impl Level {
    pub const fn as_str(self) -> &'static str {
        match self {
            Level::Verbose => "Verbose",
            Level::Debug => "Debug",
            Level::Information => "Information",
            Level::Warning => "Warning",
            Level::Error => "Error",
            Level::Fatal => "Fatal",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct LogEvent {
    timestamp: DateTime<Utc>,
    level: Level,
    message_template: MessageTemplate,
    exception: Option<String>,
    properties: IndexMap<String, PropertyValue>,
}

impl LogEvent {
    pub fn new(
        timestamp: DateTime<Utc>,
        level: Level,
        message_template: impl Into<MessageTemplate>,
    ) -> Self {
        Self {
            timestamp,
            level,
            message_template: message_template.into(),
            exception: None,
            properties: IndexMap::new(),
        }
    }

    #[must_use]
    pub fn with_exception(mut self, exception: impl Into<String>) -> Self {
        self.exception = Some(exception.into());
        self
    }

    #[must_use]
    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.insert_property(name, value);
        self
    }

    /// Adds or replaces a property. A replaced property keeps its original position.
    pub fn insert_property(
        &mut self,
        name: impl Into<String>,
        value: impl Into<PropertyValue>,
    ) -> Option<PropertyValue> {
        self.properties.insert(name.into(), value.into())
    }

    pub const fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub const fn level(&self) -> Level {
        self.level
    }

    pub const fn message_template(&self) -> &MessageTemplate {
        &self.message_template
    }

    pub fn exception(&self) -> Option<&str> {
        self.exception.as_deref()
    }

    pub const fn properties(&self) -> &IndexMap<String, PropertyValue> {
        &self.properties
    }

    /// Renders the message template against this event's properties.
    pub fn render_message(&self, provider: &dyn FormatProvider) -> String {
        self.message_template.render(&self.properties, provider)
    }
}
