use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::events::MetricsEvent;

pub type MetricsResult<T> = Result<T, MetricsError>;

#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("invalid metrics data: {0}")]
    InvalidData(String),
}

/// Append-only JSONL storage for metrics events.
///
/// One event per line. Writes only ever append; existing lines are never
/// rewritten or reordered, so a crash can at worst leave one torn final
/// line, which reads skip. Concurrent writers are not coordinated here;
/// the tolerant read is the only defense against interleaved lines.
#[derive(Debug, Clone)]
pub struct MetricsStorage {
    path: PathBuf,
}

impl MetricsStorage {
    /// Bind to a backing file path. The file does not need to exist yet.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append a single event as one JSON line, creating the file (and its
    /// parent directory) if absent. I/O failures propagate; losing a
    /// telemetry write silently would defeat the layer's purpose.
    pub fn write_event(&self, event: &MetricsEvent) -> MetricsResult<()> {
        let line = serde_json::to_string(event)?;
        let mut file = self.open_append()?;
        writeln!(file, "{}", line)?;
        Ok(())
    }

    /// Append multiple events as consecutive lines in the given order.
    ///
    /// All events are serialized before the file is touched, so a
    /// serialization failure writes nothing. An I/O failure mid-write can
    /// leave a prefix of the batch durably appended; previously existing
    /// lines are never affected.
    pub fn write_batch(&self, events: &[MetricsEvent]) -> MetricsResult<()> {
        if events.is_empty() {
            return Ok(());
        }

        let mut buffer = String::new();
        for event in events {
            buffer.push_str(&serde_json::to_string(event)?);
            buffer.push('\n');
        }

        let mut file = self.open_append()?;
        file.write_all(buffer.as_bytes())?;
        Ok(())
    }

    /// Read all events in file order. Lines that fail to decode
    /// (corrupted, truncated, or non-conforming) are skipped rather than
    /// aborting the read; a missing file yields an empty list.
    pub fn read_events(&self) -> MetricsResult<Vec<MetricsEvent>> {
        self.read_events_where(|_| true)
    }

    /// Read all events satisfying `predicate`, applied after each line
    /// decodes successfully. Same tolerance rules as [`read_events`].
    ///
    /// [`read_events`]: MetricsStorage::read_events
    pub fn read_events_where<F>(&self, predicate: F) -> MetricsResult<Vec<MetricsEvent>>
    where
        F: Fn(&MetricsEvent) -> bool,
    {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let reader = BufReader::new(File::open(&self.path)?);
        let mut events = Vec::new();

        // Lines are read as raw bytes: corruption is not guaranteed to be
        // valid UTF-8, and a torn final line can end mid-character.
        for line in reader.split(b'\n') {
            let line = line?;
            if line.iter().all(u8::is_ascii_whitespace) {
                continue;
            }

            match serde_json::from_slice::<MetricsEvent>(&line) {
                Ok(event) => {
                    if predicate(&event) {
                        events.push(event);
                    }
                }
                Err(error) => {
                    log::warn!("skipping undecodable metrics line: {}", error);
                }
            }
        }

        Ok(events)
    }

    /// Remove all persisted events. The next write starts a fresh file.
    pub fn clear(&self) -> MetricsResult<()> {
        if self.path.exists() {
            std::fs::remove_file(&self.path)?;
        }
        Ok(())
    }

    fn open_append(&self) -> MetricsResult<File> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        Ok(file)
    }
}
