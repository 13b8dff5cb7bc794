//! Log records

use crate::{Level, Value};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::panic::Location;

/// Reserved context key that triggers error unpacking
pub const ERROR_FIELD: &str = "error";

/// Attribute holding the stack trace of an unpacked rich error
pub const STACK_TRACE_FIELD: &str = "stack_trace";

/// Attribute holding the message of an unpacked rich error
pub const ERROR_CAUSE_FIELD: &str = "error_cause";

/// Source position of the logging call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SourceLocation {
    pub file: &'static str,
    pub line: u32,
}

impl SourceLocation {
    /// Location of the `#[track_caller]` chain's outermost caller
    #[track_caller]
    pub fn caller() -> Self {
        Location::caller().into()
    }
}

impl From<&'static Location<'static>> for SourceLocation {
    fn from(location: &'static Location<'static>) -> Self {
        Self {
            file: location.file(),
            line: location.line(),
        }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

/// A single log record, built fresh for every call and moved into the backend
#[derive(Debug, Clone)]
pub struct LogRecord {
    pub timestamp: DateTime<Utc>,
    pub level: Level,
    pub message: String,
    pub source: Option<SourceLocation>,
    pub attributes: HashMap<String, Value>,
}

impl LogRecord {
    pub fn new(level: Level, message: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            level,
            message: message.into(),
            source: None,
            attributes: HashMap::new(),
        }
    }

    pub fn with_source(mut self, source: SourceLocation) -> Self {
        self.source = Some(source);
        self
    }

    /// Set an attribute, replacing any previous value under the same key
    pub fn add_attr(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.attributes.insert(key.into(), value.into());
    }

    pub fn attr(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    /// Attributes sorted by key, for deterministic rendering
    pub fn sorted_attrs(&self) -> Vec<(&str, &Value)> {
        let mut attrs: Vec<_> = self
            .attributes
            .iter()
            .map(|(k, v)| (k.as_str(), v))
            .collect();
        attrs.sort_by(|a, b| a.0.cmp(b.0));
        attrs
    }
}
