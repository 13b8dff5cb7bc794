//! Backend boundary
//!
//! The backend decides which levels are enabled and writes finished records
//! to its sinks. Implementations must serialize concurrent writes themselves
//! and must never panic or surface write failures to the caller.

use crate::{Level, LogRecord, SourceLocation, Value};

pub trait LoggingBackend: Send + Sync {
    /// Whether records at `level` would be discarded
    fn should_skip(&self, level: Level) -> bool;

    /// Write a finished record
    fn dispatch(&self, record: LogRecord);

    /// Emit a warning about incorrect API usage as a structured record.
    ///
    /// `source` is the logging or enrichment call that triggered it.
    fn log_warning(&self, message: &str, source: SourceLocation, fields: Vec<(String, Value)>);

    /// Emit a plain, unstructured line (used for full stack traces)
    fn print_line(&self, text: &str);
}

/// Backend that discards everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopBackend;

impl LoggingBackend for NoopBackend {
    fn should_skip(&self, _level: Level) -> bool {
        true
    }

    fn dispatch(&self, _record: LogRecord) {}

    fn log_warning(
        &self,
        _message: &str,
        _source: SourceLocation,
        _fields: Vec<(String, Value)>,
    ) {
    }

    fn print_line(&self, _text: &str) {}
}
