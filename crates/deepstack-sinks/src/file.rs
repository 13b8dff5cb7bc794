//! Rotating JSON Lines file sink

use crate::{SetupError, Sink};
use anyhow::{Context, Result};
use chrono::{SecondsFormat, Utc};
use deepstack_core::{Level, LogRecord};
use flate2::write::GzEncoder;
use flate2::Compression;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::thread::JoinHandle;
use std::time::{Duration, SystemTime};
use tracing::{debug, info, warn};

/// Configuration for the rotating file sink
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileSinkConfig {
    /// Directory holding the active and rotated files
    pub dir: PathBuf,

    /// Name of the active file, e.g. `app.log`
    pub file_name: String,

    /// Maximum file size before rotation (bytes)
    pub max_file_size: u64,

    /// Maximum number of rotated files to keep (0 keeps all)
    pub max_files: usize,

    /// Maximum age of rotated files in days (0 keeps all)
    pub max_age_days: u64,

    /// Whether to gzip rotated files
    pub compress: bool,
}

impl Default for FileSinkConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("data/logs"),
            file_name: "app.log".to_string(),
            max_file_size: 100 * 1024 * 1024, // 100MB
            max_files: 0,
            max_age_days: 30,
            compress: true,
        }
    }
}

impl FileSinkConfig {
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            ..Self::default()
        }
    }

    /// Path of the active log file
    pub fn current_path(&self) -> PathBuf {
        self.dir.join(&self.file_name)
    }

    fn stem_and_ext(&self) -> (&str, &str) {
        match self.file_name.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() => (stem, ext),
            _ => (self.file_name.as_str(), "log"),
        }
    }

    /// Whether `name` is a rotated file (plain or compressed) of this sink
    fn is_rotated_name(&self, name: &str) -> bool {
        let (stem, ext) = self.stem_and_ext();
        let Some(rest) = name.strip_prefix(stem).and_then(|r| r.strip_prefix('-')) else {
            return false;
        };
        let plain = format!(".{}", ext);
        let gz = format!(".{}.gz", ext);
        !rest.is_empty() && (rest.ends_with(&plain) || rest.ends_with(&gz))
    }
}

/// Sink writing one JSON object per line.
///
/// The active file is rotated to `<stem>-<timestamp>.<ext>` when the next
/// record would push it over `max_file_size`. Rotated files are optionally
/// gzipped on a background thread and pruned by count and age.
pub struct RotatingFileSink {
    config: FileSinkConfig,
    min_level: Level,
    state: Mutex<FileState>,
    compressions: Mutex<Vec<JoinHandle<()>>>,
}

struct FileState {
    writer: BufWriter<File>,
    size: u64,
}

impl RotatingFileSink {
    /// Open (or create) the active file, creating the directory if needed
    pub fn open(config: FileSinkConfig) -> std::result::Result<Self, SetupError> {
        std::fs::create_dir_all(&config.dir).map_err(|source| SetupError::CreateDir {
            path: config.dir.clone(),
            source,
        })?;

        let path = config.current_path();
        let file = open_append(&path).map_err(|source| SetupError::OpenFile {
            path: path.clone(),
            source,
        })?;
        let size = file.metadata().map(|m| m.len()).unwrap_or(0);

        let sink = Self {
            config,
            min_level: Level::Debug,
            state: Mutex::new(FileState {
                writer: BufWriter::new(file),
                size,
            }),
            compressions: Mutex::new(Vec::new()),
        };
        if let Err(e) = sink.cleanup_old_files() {
            warn!("Failed to clean up old log files: {:#}", e);
        }
        Ok(sink)
    }

    pub fn with_min_level(mut self, level: Level) -> Self {
        self.min_level = level;
        self
    }

    pub fn config(&self) -> &FileSinkConfig {
        &self.config
    }

    fn rotate(&self, state: &mut FileState) -> Result<()> {
        info!("Rotating log file in {:?}", self.config.dir);

        state.writer.flush()?;

        // The active file may have been moved or deleted by another process
        let current_path = self.config.current_path();
        let rotated_path = if current_path.exists() {
            let rotated_path = self.rotated_path();
            match std::fs::rename(&current_path, &rotated_path) {
                Ok(()) => Some(rotated_path),
                Err(e) => {
                    warn!("Failed to rename {:?}: {}", current_path, e);
                    None
                }
            }
        } else {
            debug!("Active log file {:?} is gone, recreating it", current_path);
            None
        };

        let file = open_append(&current_path).context("Failed to open log file")?;
        state.size = file.metadata().map(|m| m.len()).unwrap_or(0);
        state.writer = BufWriter::new(file);

        if let (Some(path), true) = (rotated_path, self.config.compress) {
            let handle = std::thread::spawn(move || {
                if let Err(e) = compress_log_file(&path) {
                    warn!("Failed to compress log file: {:#}", e);
                }
            });
            let mut compressions = self.compressions.lock();
            compressions.retain(|h| !h.is_finished());
            compressions.push(handle);
        }

        if let Err(e) = self.cleanup_old_files() {
            warn!("Failed to clean up old log files: {:#}", e);
        }

        Ok(())
    }

    fn rotated_path(&self) -> PathBuf {
        let (stem, ext) = self.config.stem_and_ext();
        let timestamp = Utc::now().format("%Y-%m-%dT%H-%M-%S%.3f");
        let base = format!("{}-{}", stem, timestamp);

        let mut candidate = self.config.dir.join(format!("{}.{}", base, ext));
        let mut n = 1;
        while candidate.exists() || candidate.with_extension(format!("{}.gz", ext)).exists() {
            candidate = self.config.dir.join(format!("{}-{}.{}", base, n, ext));
            n += 1;
        }
        candidate
    }

    fn cleanup_old_files(&self) -> Result<()> {
        let mut rotated = Vec::new();
        for entry in std::fs::read_dir(&self.config.dir)? {
            let entry = entry?;
            let path = entry.path();
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if !self.config.is_rotated_name(name) {
                continue;
            }
            if let Ok(modified) = entry.metadata().and_then(|m| m.modified()) {
                rotated.push((path, modified));
            }
        }

        // Oldest first
        rotated.sort_by_key(|(_, modified)| *modified);

        let mut expired = 0;
        if self.config.max_age_days > 0 {
            let max_age = Duration::from_secs(self.config.max_age_days * 24 * 60 * 60);
            let cutoff = SystemTime::now()
                .checked_sub(max_age)
                .unwrap_or(SystemTime::UNIX_EPOCH);
            expired = rotated.iter().filter(|(_, m)| *m < cutoff).count();
        }

        let over_limit = if self.config.max_files > 0 {
            rotated.len().saturating_sub(self.config.max_files)
        } else {
            0
        };

        for (path, _) in rotated.iter().take(expired.max(over_limit)) {
            if let Err(e) = std::fs::remove_file(path) {
                warn!("Failed to remove old log file {:?}: {}", path, e);
            } else {
                debug!("Removed old log file: {:?}", path);
            }
        }

        Ok(())
    }
}

impl Sink for RotatingFileSink {
    fn name(&self) -> &'static str {
        "file"
    }

    fn enabled(&self, level: Level) -> bool {
        level >= self.min_level
    }

    fn write(&self, record: &LogRecord) -> Result<()> {
        let mut line = render_json(record).context("Failed to serialize log record")?;
        line.push('\n');
        let line_len = line.len() as u64;

        let mut state = self.state.lock();
        if state.size > 0 && state.size + line_len > self.config.max_file_size {
            self.rotate(&mut state)?;
        }

        state.writer.write_all(line.as_bytes())?;
        state.writer.flush()?;
        state.size += line_len;

        Ok(())
    }

    fn flush(&self) -> Result<()> {
        self.state.lock().writer.flush()?;
        let pending: Vec<_> = self.compressions.lock().drain(..).collect();
        for handle in pending {
            let _ = handle.join();
        }
        Ok(())
    }
}

fn open_append(path: &Path) -> std::io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

/// Render a record as a single JSON object.
///
/// Built-in keys (`time`, `level`, `source`, `msg`) come first and are not
/// overwritten by attributes of the same name.
pub fn render_json(record: &LogRecord) -> serde_json::Result<String> {
    let mut obj = serde_json::Map::new();
    obj.insert(
        "time".to_string(),
        record
            .timestamp
            .to_rfc3339_opts(SecondsFormat::Micros, true)
            .into(),
    );
    obj.insert("level".to_string(), record.level.label().into());
    if let Some(source) = record.source {
        obj.insert("source".to_string(), serde_json::to_value(source)?);
    }
    obj.insert("msg".to_string(), record.message.clone().into());
    for (key, value) in record.sorted_attrs() {
        obj.entry(key.to_string()).or_insert_with(|| value.to_json());
    }
    serde_json::to_string(&obj)
}

/// Compress a rotated file to `<name>.gz` and remove the original
fn compress_log_file(path: &Path) -> Result<()> {
    let mut gz_name = path.as_os_str().to_owned();
    gz_name.push(".gz");
    let gz_path = PathBuf::from(gz_name);

    let content = std::fs::read(path)?;
    let file = File::create(&gz_path)?;
    let mut encoder = GzEncoder::new(file, Compression::default());
    encoder.write_all(&content)?;
    encoder.finish()?;

    std::fs::remove_file(path)?;

    info!("Compressed log file: {:?} -> {:?}", path, gz_path);
    Ok(())
}
