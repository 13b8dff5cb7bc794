//! Colored single-line console renderer

use crate::Sink;
use anyhow::Result;
use deepstack_core::{Level, LogRecord, STACK_TRACE_FIELD};
use parking_lot::Mutex;
use std::fmt::Write as _;
use std::io::Write;
use std::path::{Path, PathBuf};

const RESET: &str = "\x1b[0m";

fn level_color(level: Level) -> &'static str {
    match level {
        Level::Debug => "\x1b[36m", // cyan
        Level::Info => "\x1b[32m",  // green
        Level::Warn => "\x1b[33m",  // yellow
        Level::Error => "\x1b[31m", // red
    }
}

/// Console sink.
///
/// Line format: `<time> <LEVEL> <file:line> "<message>" key=value ...`,
/// attributes sorted by key. `stack_trace` is left out since the logger prints
/// it separately.
pub struct ConsoleSink {
    writer: Mutex<Box<dyn Write + Send>>,
    min_level: Level,
    ansi: bool,
    work_dir: Option<PathBuf>,
}

impl ConsoleSink {
    /// Write to any writer, without colors
    pub fn new(writer: impl Write + Send + 'static) -> Self {
        Self {
            writer: Mutex::new(Box::new(writer)),
            min_level: Level::Debug,
            ansi: false,
            work_dir: None,
        }
    }

    /// Colored output to stdout
    pub fn stdout() -> Self {
        Self::new(std::io::stdout()).with_ansi(true)
    }

    pub fn with_min_level(mut self, level: Level) -> Self {
        self.min_level = level;
        self
    }

    pub fn with_ansi(mut self, ansi: bool) -> Self {
        self.ansi = ansi;
        self
    }

    /// Show source files under `dir` relative to it
    pub fn with_work_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.work_dir = Some(dir.into());
        self
    }

    /// Render a record as one line, without the trailing newline
    pub fn render(&self, record: &LogRecord) -> String {
        let (color, reset) = if self.ansi {
            (level_color(record.level), RESET)
        } else {
            ("", "")
        };

        let location = record
            .source
            .map(|src| format!("{}:{}", self.display_path(src.file), src.line))
            .unwrap_or_else(|| "-".to_string());

        let mut line = format!(
            "{}{} {} {} {:?}",
            color,
            record.timestamp.format("%Y-%m-%d %H:%M:%S%.3f"),
            record.level.label(),
            location,
            record.message
        );
        for (key, value) in record.sorted_attrs() {
            if key == STACK_TRACE_FIELD {
                continue;
            }
            let _ = write!(line, " {}={}", key, value);
        }
        line.push_str(reset);
        line
    }

    fn display_path(&self, file: &str) -> String {
        let path = Path::new(file);
        self.work_dir
            .as_deref()
            .and_then(|dir| path.strip_prefix(dir).ok())
            .unwrap_or(path)
            .display()
            .to_string()
    }
}

impl Sink for ConsoleSink {
    fn name(&self) -> &'static str {
        "console"
    }

    fn enabled(&self, level: Level) -> bool {
        level >= self.min_level
    }

    fn write(&self, record: &LogRecord) -> Result<()> {
        let line = self.render(record);
        let mut writer = self.writer.lock();
        writeln!(writer, "{}", line)?;
        writer.flush()?;
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        self.writer.lock().flush()?;
        Ok(())
    }
}
