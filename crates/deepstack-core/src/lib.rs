//! # DeepStack Core
//!
//! Structured logging with rich errors.
//!
//! ## Modules
//!
//! - `level` - Severity levels and level parsing
//! - `value` - Attribute values and key/value input lists
//! - `record` - Log records and reserved attribute keys
//! - `error` - Rich errors carrying a stack trace and context
//! - `stack` - Call stack capture
//! - `sanitize` - Key/value validation and misuse reporting
//! - `backend` - The backend boundary that gates and writes records
//! - `logger` - The leveled logger tying everything together
//!
//! ```
//! use deepstack_core::{kv, Level, Logger, LoggerOptions, NoopBackend, BacktraceStackTracer};
//! use std::sync::Arc;
//!
//! let logger = Logger::new(
//!     Arc::new(NoopBackend),
//!     Arc::new(BacktraceStackTracer::new()),
//!     LoggerOptions::default(),
//! );
//! let err = logger.new_error("user not found", [("user_id", 42)]);
//! logger.error("request failed", kv!["error", err, "path", "/users/42"]);
//! assert!(!logger.enabled(Level::Debug));
//! ```

pub mod backend;
pub mod error;
pub mod level;
pub mod logger;
pub mod record;
pub mod sanitize;
pub mod stack;
pub mod value;

pub use backend::{LoggingBackend, NoopBackend};
pub use error::RichError;
pub use level::Level;
pub use logger::{Logger, LoggerOptions};
pub use record::{
    LogRecord, SourceLocation, ERROR_CAUSE_FIELD, ERROR_FIELD, STACK_TRACE_FIELD,
};
pub use sanitize::Misuse;
pub use stack::{BacktraceStackTracer, StackTracer, DEFAULT_MAX_FRAMES};
pub use value::{ErrorValue, KeyValues, Value};
