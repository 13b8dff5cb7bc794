//! Call stack capture

use std::fmt::Write;
use std::path::{Path, PathBuf};

/// Maximum number of frames rendered by default
pub const DEFAULT_MAX_FRAMES: usize = 32;

/// Upper bound on frames resolved before filtering
const RESOLVE_LIMIT: usize = 256;

/// Leading frames with these prefixes belong to the capture machinery or to
/// the logger itself and are never part of a trace.
const INTERNAL_PREFIXES: &[&str] = &[
    "backtrace::",
    "deepstack_core::stack",
    "deepstack_core::error",
    "deepstack_core::logger",
];

const UNKNOWN: &str = "<unknown>";

/// Captures the current call stack as text.
///
/// Output is one frame per entry, innermost first, formatted as
/// `<function>\n\t<file>:<line>\n`. Capture never fails and never returns an
/// empty string.
pub trait StackTracer: Send + Sync {
    /// Capture the stack, skipping `skip_frames` frames nearest the caller
    /// in addition to the logger's own frames.
    fn capture(&self, skip_frames: usize) -> String;
}

/// [`StackTracer`] backed by the `backtrace` crate
#[derive(Debug, Clone)]
pub struct BacktraceStackTracer {
    work_dir: Option<PathBuf>,
    max_frames: usize,
}

#[derive(Debug)]
struct Frame {
    function: String,
    file: Option<PathBuf>,
    line: Option<u32>,
}

impl BacktraceStackTracer {
    pub fn new() -> Self {
        Self {
            work_dir: None,
            max_frames: DEFAULT_MAX_FRAMES,
        }
    }

    /// Render file paths under `dir` relative to it
    pub fn with_work_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.work_dir = Some(dir.into());
        self
    }

    pub fn with_max_frames(mut self, max_frames: usize) -> Self {
        self.max_frames = max_frames.max(1);
        self
    }

    fn resolve_frames() -> Vec<Frame> {
        let mut frames = Vec::new();
        backtrace::trace(|raw| {
            let before = frames.len();
            backtrace::resolve_frame(raw, |symbol| {
                frames.push(Frame {
                    function: symbol
                        .name()
                        .map(|name| format!("{:#}", name))
                        .unwrap_or_else(|| UNKNOWN.to_string()),
                    file: symbol.filename().map(Path::to_path_buf),
                    line: symbol.lineno(),
                });
            });
            if frames.len() == before {
                frames.push(Frame {
                    function: UNKNOWN.to_string(),
                    file: None,
                    line: None,
                });
            }
            frames.len() < RESOLVE_LIMIT
        });
        frames
    }

    fn display_path(&self, file: &Path) -> String {
        self.work_dir
            .as_deref()
            .and_then(|dir| file.strip_prefix(dir).ok())
            .unwrap_or(file)
            .display()
            .to_string()
    }
}

impl Default for BacktraceStackTracer {
    fn default() -> Self {
        Self::new()
    }
}

impl StackTracer for BacktraceStackTracer {
    fn capture(&self, skip_frames: usize) -> String {
        let frames = Self::resolve_frames();
        let first_external = frames
            .iter()
            .position(|frame| !is_internal(&frame.function))
            .unwrap_or(frames.len());

        let mut out = String::new();
        for frame in frames
            .iter()
            .skip(first_external)
            .skip(skip_frames)
            .take(self.max_frames)
        {
            let file = frame
                .file
                .as_deref()
                .map(|f| self.display_path(f))
                .unwrap_or_else(|| UNKNOWN.to_string());
            let _ = writeln!(
                out,
                "{}\n\t{}:{}",
                frame.function,
                file,
                frame.line.unwrap_or(0)
            );
        }

        if out.is_empty() {
            out = format!("{}\n\t{}:0\n", UNKNOWN, UNKNOWN);
        }
        out
    }
}

fn is_internal(function: &str) -> bool {
    let name = function.trim_start_matches('<');
    INTERNAL_PREFIXES.iter().any(|prefix| name.starts_with(prefix))
}
