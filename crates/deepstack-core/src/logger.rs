//! Leveled logging with rich-error unpacking

use crate::sanitize::{self, Misuse};
use crate::{
    ErrorValue, KeyValues, Level, LogRecord, LoggingBackend, RichError, SourceLocation,
    StackTracer, Value, ERROR_CAUSE_FIELD, ERROR_FIELD, STACK_TRACE_FIELD,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Logger behaviour fixed at construction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggerOptions {
    /// Warn when a non-rich error is logged under the `error` key or enriched
    pub warn_on_foreign_errors: bool,

    /// Extra frames to drop from captured stack traces
    pub stack_skip_frames: usize,
}

impl Default for LoggerOptions {
    fn default() -> Self {
        Self {
            warn_on_foreign_errors: true,
            stack_skip_frames: 0,
        }
    }
}

/// Structured logger.
///
/// Cheap to clone; all clones share the same backend and stack tracer.
/// Logging never fails: malformed input produces warning records instead.
#[derive(Clone)]
pub struct Logger {
    backend: Arc<dyn LoggingBackend>,
    tracer: Arc<dyn StackTracer>,
    options: LoggerOptions,
}

impl Logger {
    pub fn new(
        backend: Arc<dyn LoggingBackend>,
        tracer: Arc<dyn StackTracer>,
        options: LoggerOptions,
    ) -> Self {
        Self {
            backend,
            tracer,
            options,
        }
    }

    pub fn backend(&self) -> &Arc<dyn LoggingBackend> {
        &self.backend
    }

    pub fn options(&self) -> LoggerOptions {
        self.options
    }

    /// Whether records at `level` reach the backend
    pub fn enabled(&self, level: Level) -> bool {
        !self.backend.should_skip(level)
    }

    #[track_caller]
    pub fn debug(&self, message: &str, kv: impl Into<KeyValues>) {
        self.log(Level::Debug, message, kv);
    }

    #[track_caller]
    pub fn info(&self, message: &str, kv: impl Into<KeyValues>) {
        self.log(Level::Info, message, kv);
    }

    #[track_caller]
    pub fn warn(&self, message: &str, kv: impl Into<KeyValues>) {
        self.log(Level::Warn, message, kv);
    }

    #[track_caller]
    pub fn error(&self, message: &str, kv: impl Into<KeyValues>) {
        self.log(Level::Error, message, kv);
    }

    /// Log `message` at `level`.
    ///
    /// A rich error under the `error` key is unpacked into its context,
    /// `stack_trace` and `error_cause`; its stack trace is also printed as a
    /// plain line after the record.
    #[track_caller]
    pub fn log(&self, level: Level, message: &str, kv: impl Into<KeyValues>) {
        if self.backend.should_skip(level) {
            return;
        }

        let source = SourceLocation::caller();
        let mut fields = self.sanitize(kv.into(), source);
        let error = fields.remove(ERROR_FIELD);

        let mut record = LogRecord::new(level, message).with_source(source);
        record.attributes.extend(fields);

        // Unpacked last so the error's context wins over explicit attributes
        let stack_trace = match error {
            Some(value) => self.unpack_error(&mut record, value, source),
            None => String::new(),
        };

        self.backend.dispatch(record);
        if !stack_trace.is_empty() {
            self.backend.print_line(&stack_trace);
        }
    }

    /// Create a rich error capturing the current stack.
    ///
    /// Runs regardless of the configured level.
    #[track_caller]
    pub fn new_error(&self, message: impl Into<String>, kv: impl Into<KeyValues>) -> RichError {
        let context = self.sanitize(kv.into(), SourceLocation::caller());
        RichError::new(message, self.capture_stack(), context)
    }

    /// Add context to an error.
    ///
    /// A rich error is enriched in place and returned (same logical error,
    /// same stack trace). Any other error is replaced by a new rich error
    /// carrying its description and a stack trace captured here.
    #[track_caller]
    pub fn add_context(&self, err: impl Into<ErrorValue>, kv: impl Into<KeyValues>) -> RichError {
        let source = SourceLocation::caller();
        let entries = self.sanitize(kv.into(), source);
        match err.into() {
            ErrorValue::Rich(rich) => {
                rich.merge_context(entries);
                rich
            }
            ErrorValue::Opaque(description) => {
                self.report_foreign_error("error", source);
                RichError::new(description, self.capture_stack(), entries)
            }
        }
    }

    fn sanitize(&self, kv: KeyValues, source: SourceLocation) -> HashMap<String, Value> {
        if kv.is_empty() {
            return HashMap::new();
        }
        sanitize::sanitize(kv, |misuse| self.report(misuse, source))
    }

    fn unpack_error(&self, record: &mut LogRecord, value: Value, source: SourceLocation) -> String {
        match value {
            Value::Error(ErrorValue::Rich(err)) => {
                record.attributes.extend(err.context());
                record.add_attr(STACK_TRACE_FIELD, err.stack_trace());
                record.add_attr(ERROR_CAUSE_FIELD, err.message());
                err.stack_trace().to_string()
            }
            other => {
                self.report_foreign_error(other.type_name(), source);
                record.add_attr(ERROR_FIELD, other);
                String::new()
            }
        }
    }

    fn report_foreign_error(&self, actual_type: &'static str, source: SourceLocation) {
        if self.options.warn_on_foreign_errors {
            self.report(Misuse::InvalidErrorType { actual_type }, source);
        }
    }

    /// Warnings point at the logging call that misused the API
    fn report(&self, misuse: Misuse, source: SourceLocation) {
        self.backend
            .log_warning(misuse.message(), source, vec![misuse.field()]);
    }

    fn capture_stack(&self) -> String {
        self.tracer.capture(self.options.stack_skip_frames)
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}
