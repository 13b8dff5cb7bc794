//! # DeepStack Sinks
//!
//! Backends and sinks for the DeepStack logger.
//!
//! ## Modules
//!
//! - `sink` - The sink trait
//! - `console` - Colored single-line console output
//! - `file` - Rotating, compressing JSON Lines file output
//! - `tracing_sink` - Forwarding into `tracing`
//! - `backend` - The multi-sink backend
//! - `config` - Configuration, environment loading and logger bootstrap

pub mod backend;
pub mod config;
pub mod console;
pub mod file;
pub mod sink;
pub mod tracing_sink;

pub use backend::SinkBackend;
pub use config::{build_backend, logger_for, new_logger, LoggerConfig, SetupError};
pub use console::ConsoleSink;
pub use file::{render_json, FileSinkConfig, RotatingFileSink};
pub use sink::Sink;
pub use tracing_sink::{TracingSink, TRACING_TARGET};
