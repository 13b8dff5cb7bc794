//! Multi-sink backend

use crate::Sink;
use deepstack_core::{Level, LogRecord, LoggingBackend, SourceLocation, Value};
use parking_lot::Mutex;
use std::io::Write;
use tracing::warn;

/// Backend writing every record to all sinks that accept its level.
///
/// A level is skipped when it is below the backend threshold or when no sink
/// accepts it. A failing sink is reported through `tracing` and does not keep
/// the other sinks from receiving the record.
pub struct SinkBackend {
    level: Level,
    sinks: Vec<Box<dyn Sink>>,
    plain: Mutex<Box<dyn Write + Send>>,
}

impl SinkBackend {
    /// Backend with no sinks yet; plain lines go to stderr
    pub fn new(level: Level) -> Self {
        Self {
            level,
            sinks: Vec::new(),
            plain: Mutex::new(Box::new(std::io::stderr())),
        }
    }

    pub fn with_sink(mut self, sink: impl Sink + 'static) -> Self {
        self.sinks.push(Box::new(sink));
        self
    }

    /// Destination of plain lines such as full stack traces
    pub fn with_plain_writer(mut self, writer: impl Write + Send + 'static) -> Self {
        self.plain = Mutex::new(Box::new(writer));
        self
    }

    pub fn level(&self) -> Level {
        self.level
    }

    pub fn sink_names(&self) -> Vec<&'static str> {
        self.sinks.iter().map(|s| s.name()).collect()
    }

    /// Flush every sink, waiting for background compression to finish
    pub fn flush(&self) {
        for sink in &self.sinks {
            if let Err(e) = sink.flush() {
                warn!(sink = sink.name(), "Failed to flush log sink: {:#}", e);
            }
        }
        let _ = self.plain.lock().flush();
    }
}

impl LoggingBackend for SinkBackend {
    fn should_skip(&self, level: Level) -> bool {
        level < self.level || !self.sinks.iter().any(|s| s.enabled(level))
    }

    fn dispatch(&self, record: LogRecord) {
        for sink in self.sinks.iter().filter(|s| s.enabled(record.level)) {
            if let Err(e) = sink.write(&record) {
                warn!(sink = sink.name(), "Failed to write log record: {:#}", e);
            }
        }
    }

    fn log_warning(&self, message: &str, source: SourceLocation, fields: Vec<(String, Value)>) {
        if self.should_skip(Level::Warn) {
            return;
        }
        let mut record = LogRecord::new(Level::Warn, message).with_source(source);
        record.attributes.extend(fields);
        self.dispatch(record);
    }

    fn print_line(&self, text: &str) {
        let mut plain = self.plain.lock();
        let _ = writeln!(plain, "{}", text.trim_end_matches('\n'));
        let _ = plain.flush();
    }
}

impl std::fmt::Debug for SinkBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SinkBackend")
            .field("level", &self.level)
            .field("sinks", &self.sink_names())
            .finish_non_exhaustive()
    }
}
