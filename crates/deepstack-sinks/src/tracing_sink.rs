//! Bridge into the `tracing` ecosystem

use crate::Sink;
use anyhow::Result;
use deepstack_core::{Level, LogRecord};

/// Target of every event emitted by [`TracingSink`]
pub const TRACING_TARGET: &str = "deepstack";

/// Sink forwarding records as `tracing` events.
///
/// Attributes travel as one JSON-encoded `attributes` field since `tracing`
/// field names are fixed at compile time.
#[derive(Debug, Clone, Copy)]
pub struct TracingSink {
    min_level: Level,
}

impl TracingSink {
    pub fn new() -> Self {
        Self {
            min_level: Level::Debug,
        }
    }

    pub fn with_min_level(mut self, level: Level) -> Self {
        self.min_level = level;
        self
    }
}

impl Default for TracingSink {
    fn default() -> Self {
        Self::new()
    }
}

impl Sink for TracingSink {
    fn name(&self) -> &'static str {
        "tracing"
    }

    fn enabled(&self, level: Level) -> bool {
        level >= self.min_level
    }

    fn write(&self, record: &LogRecord) -> Result<()> {
        let attributes: serde_json::Map<String, serde_json::Value> = record
            .sorted_attrs()
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_json()))
            .collect();
        let attributes = serde_json::to_string(&attributes)?;
        let source = record
            .source
            .map(|s| s.to_string())
            .unwrap_or_default();
        let message = record.message.as_str();

        match record.level {
            Level::Debug => {
                tracing::debug!(target: TRACING_TARGET, source = %source, attributes = %attributes, "{}", message)
            }
            Level::Info => {
                tracing::info!(target: TRACING_TARGET, source = %source, attributes = %attributes, "{}", message)
            }
            Level::Warn => {
                tracing::warn!(target: TRACING_TARGET, source = %source, attributes = %attributes, "{}", message)
            }
            Level::Error => {
                tracing::error!(target: TRACING_TARGET, source = %source, attributes = %attributes, "{}", message)
            }
        }
        Ok(())
    }
}
