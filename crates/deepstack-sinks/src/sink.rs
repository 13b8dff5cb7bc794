//! Sink trait

use anyhow::Result;
use deepstack_core::{Level, LogRecord};

/// Destination for finished log records.
///
/// Implementations serialize their own writes; a sink is shared by every
/// thread that logs through the backend.
pub trait Sink: Send + Sync {
    /// Short name used in diagnostics
    fn name(&self) -> &'static str;

    /// Whether this sink accepts records at `level`
    fn enabled(&self, level: Level) -> bool;

    /// Write one record
    fn write(&self, record: &LogRecord) -> Result<()>;

    /// Flush buffered output and finish background work
    fn flush(&self) -> Result<()> {
        Ok(())
    }
}
