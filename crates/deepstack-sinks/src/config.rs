//! Logger configuration and bootstrap

use crate::{ConsoleSink, FileSinkConfig, RotatingFileSink, SinkBackend};
use deepstack_core::{BacktraceStackTracer, Level, Logger, LoggerOptions};
use serde::{Deserialize, Deserializer, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// Errors raised while setting up the logger
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("failed to create log directory {path:?}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to open log file {path:?}: {source}")]
    OpenFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid value {value:?} for {name}")]
    InvalidEnv { name: &'static str, value: String },
}

pub mod env {
    pub const LEVEL: &str = "DEEPSTACK_LOG_LEVEL";
    pub const DIR: &str = "DEEPSTACK_LOG_DIR";
    pub const FILE: &str = "DEEPSTACK_LOG_FILE";
    pub const MAX_SIZE_MB: &str = "DEEPSTACK_LOG_MAX_SIZE_MB";
    pub const MAX_FILES: &str = "DEEPSTACK_LOG_MAX_FILES";
    pub const MAX_AGE_DAYS: &str = "DEEPSTACK_LOG_MAX_AGE_DAYS";
    pub const COMPRESS: &str = "DEEPSTACK_LOG_COMPRESS";
    pub const CONSOLE: &str = "DEEPSTACK_LOG_CONSOLE";
    pub const WARN_FOREIGN_ERRORS: &str = "DEEPSTACK_WARN_FOREIGN_ERRORS";
}

/// Logger configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggerConfig {
    /// Minimum level; unrecognized names fall back to `info`
    #[serde(deserialize_with = "deserialize_level")]
    pub level: Level,

    /// Logger behaviour
    #[serde(flatten)]
    pub options: LoggerOptions,

    /// Write to stdout
    pub console: bool,

    /// Color console output
    pub ansi: bool,

    /// Rotating file output (`None` disables it)
    pub file: Option<FileSinkConfig>,

    /// Base for relative paths in console output and stack traces.
    /// Defaults to the current directory.
    pub work_dir: Option<PathBuf>,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            level: Level::Info,
            options: LoggerOptions::default(),
            console: true,
            ansi: true,
            file: Some(FileSinkConfig::default()),
            work_dir: None,
        }
    }
}

fn deserialize_level<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Level, D::Error> {
    let name = String::deserialize(deserializer)?;
    Ok(Level::from_config(&name))
}

impl LoggerConfig {
    /// Defaults overridden by `DEEPSTACK_*` environment variables.
    ///
    /// A `.env` file in the current directory is loaded first if present.
    pub fn from_env() -> Result<Self, SetupError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Like [`from_env`](Self::from_env) with an arbitrary variable source
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, SetupError> {
        let mut config = Self::default();

        if let Some(level) = lookup(env::LEVEL) {
            config.level = Level::from_config(&level);
        }
        if let Some(console) = lookup(env::CONSOLE) {
            config.console = parse_bool(env::CONSOLE, &console)?;
        }
        if let Some(warn) = lookup(env::WARN_FOREIGN_ERRORS) {
            config.options.warn_on_foreign_errors = parse_bool(env::WARN_FOREIGN_ERRORS, &warn)?;
        }

        let mut file = FileSinkConfig::default();
        if let Some(dir) = lookup(env::DIR) {
            if dir.is_empty() || dir.eq_ignore_ascii_case("off") {
                config.file = None;
                return Ok(config);
            }
            file.dir = PathBuf::from(dir);
        }
        if let Some(name) = lookup(env::FILE) {
            file.file_name = name;
        }
        if let Some(size) = lookup(env::MAX_SIZE_MB) {
            let mb: u64 = parse_number(env::MAX_SIZE_MB, &size)?;
            file.max_file_size = mb.saturating_mul(1024 * 1024);
        }
        if let Some(files) = lookup(env::MAX_FILES) {
            file.max_files = parse_number(env::MAX_FILES, &files)?;
        }
        if let Some(days) = lookup(env::MAX_AGE_DAYS) {
            file.max_age_days = parse_number(env::MAX_AGE_DAYS, &days)?;
        }
        if let Some(compress) = lookup(env::COMPRESS) {
            file.compress = parse_bool(env::COMPRESS, &compress)?;
        }
        config.file = Some(file);

        Ok(config)
    }
}

fn parse_number<T: std::str::FromStr>(name: &'static str, value: &str) -> Result<T, SetupError> {
    value.trim().parse().map_err(|_| SetupError::InvalidEnv {
        name,
        value: value.to_string(),
    })
}

fn parse_bool(name: &'static str, value: &str) -> Result<bool, SetupError> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(SetupError::InvalidEnv {
            name,
            value: value.to_string(),
        }),
    }
}

/// Build the console and file sinks described by `config`
pub fn build_backend(config: &LoggerConfig) -> Result<SinkBackend, SetupError> {
    let work_dir = resolve_work_dir(config);
    let mut backend = SinkBackend::new(config.level);

    if config.console {
        let mut console = ConsoleSink::stdout().with_ansi(config.ansi);
        if let Some(dir) = &work_dir {
            console = console.with_work_dir(dir);
        }
        backend = backend.with_sink(console);
    }
    if let Some(file) = &config.file {
        backend = backend.with_sink(RotatingFileSink::open(file.clone())?);
    }

    debug!(
        level = %config.level,
        sinks = ?backend.sink_names(),
        "Logging backend initialized"
    );
    Ok(backend)
}

/// Build a logger writing to `backend` with the stack tracer and options
/// described by `config`
pub fn logger_for(config: &LoggerConfig, backend: Arc<SinkBackend>) -> Logger {
    let mut tracer = BacktraceStackTracer::new();
    if let Some(dir) = resolve_work_dir(config) {
        tracer = tracer.with_work_dir(dir);
    }
    Logger::new(backend, Arc::new(tracer), config.options)
}

/// Build a ready-to-use logger from `config`
pub fn new_logger(config: &LoggerConfig) -> Result<Logger, SetupError> {
    let backend = Arc::new(build_backend(config)?);
    Ok(logger_for(config, backend))
}

fn resolve_work_dir(config: &LoggerConfig) -> Option<PathBuf> {
    config
        .work_dir
        .clone()
        .or_else(|| std::env::current_dir().ok())
}
