//! Operation journal: the logging sink for synchronization events.
//!
//! Every mutating operation produces exactly one [`LogEvent`], delivered to
//! an [`EventSink`]. The sink handle is passed explicitly into the engine
//! and executor; there is no global logger singleton. The production sink,
//! [`SyncJournal`], appends to a dated log file and mirrors every event to
//! the console through `tracing`. A sink failure never aborts
//! synchronization: the journal degrades to console-only output.
//! [`MemorySink`] captures events for tests.

use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Local};
use tracing::{error, info, warn};

use crate::utils::errors::SyncError;

/// Category of a journaled event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Info,
    Okay,
    Error,
    Created,
    Deleted,
    Updated,
}

impl EventKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::Info => "INFO",
            EventKind::Okay => "OKAY",
            EventKind::Error => "ERROR",
            EventKind::Created => "CREATED",
            EventKind::Deleted => "DELETED",
            EventKind::Updated => "UPDATED",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// One record of an attempted or completed action. Immutable once emitted.
#[derive(Debug, Clone)]
pub struct LogEvent {
    pub kind: EventKind,
    pub message: String,
    pub timestamp: DateTime<Local>,
}

impl LogEvent {
    pub fn new(kind: EventKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            timestamp: Local::now(),
        }
    }

    /// The journal line format: `[timestamp] KIND    - message`.
    pub fn format_line(&self) -> String {
        format!(
            "[{}] {:<7} - {}",
            self.timestamp.format("%Y-%m-%d %H:%M:%S%.3f"),
            self.kind.as_str(),
            self.message
        )
    }
}

/// Destination for journal events.
///
/// Implementations must deliver best-effort: `emit` is infallible from the
/// caller's point of view, and a failing destination must degrade rather
/// than propagate.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: &LogEvent);
}

/// The production sink: a dated log file plus the live console stream.
#[derive(Debug)]
pub struct SyncJournal {
    path: PathBuf,
    file: Mutex<Option<File>>,
}

impl SyncJournal {
    /// Create a new journal file in `log_folder`, named after the current
    /// local time (`YYYY-MM-DD_HH-MM-SS_sync_log.txt`). The folder must
    /// already exist.
    pub fn create(log_folder: &Path) -> Result<Self, SyncError> {
        let name = format!("{}_sync_log.txt", Local::now().format("%Y-%m-%d_%H-%M-%S"));
        let path = log_folder.join(name);
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|source| SyncError::SinkUnavailable {
                path: path.clone(),
                source,
            })?;

        Ok(Self {
            path,
            file: Mutex::new(Some(file)),
        })
    }

    /// Path of the journal file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl EventSink for SyncJournal {
    fn emit(&self, event: &LogEvent) {
        // Console stream goes through tracing; ERROR events at error level.
        match event.kind {
            EventKind::Error => error!(kind = event.kind.as_str(), "{}", event.message),
            _ => info!(kind = event.kind.as_str(), "{}", event.message),
        }

        let mut guard = self.file.lock().expect("journal lock poisoned");
        if let Some(file) = guard.as_mut() {
            if let Err(e) = writeln!(file, "{}", event.format_line()) {
                warn!(
                    path = %self.path.display(),
                    error = %e,
                    "log file unwritable, continuing with console output only"
                );
                *guard = None;
            }
        }
    }
}

/// Collects events in memory. For tests and embedding.
#[derive(Default)]
pub struct MemorySink {
    events: Mutex<Vec<LogEvent>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<LogEvent> {
        self.events.lock().expect("sink lock poisoned").clone()
    }

    /// Number of recorded events of the given kind.
    pub fn count(&self, kind: EventKind) -> usize {
        self.events
            .lock()
            .expect("sink lock poisoned")
            .iter()
            .filter(|e| e.kind == kind)
            .count()
    }
}

impl EventSink for MemorySink {
    fn emit(&self, event: &LogEvent) {
        self.events
            .lock()
            .expect("sink lock poisoned")
            .push(event.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_format_line_pads_kind() {
        let event = LogEvent::new(EventKind::Okay, "all folders exist");
        let line = event.format_line();

        assert!(line.contains("OKAY    - all folders exist"));
        assert!(line.starts_with('['));
    }

    #[test]
    fn test_journal_appends_lines_to_file() {
        let temp_dir = TempDir::new().unwrap();
        let journal = SyncJournal::create(temp_dir.path()).unwrap();

        journal.emit(&LogEvent::new(EventKind::Created, "/replica/a.txt"));
        journal.emit(&LogEvent::new(EventKind::Deleted, "/replica/b.txt"));

        let contents = fs::read_to_string(journal.path()).unwrap();
        let lines: Vec<_> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("CREATED - /replica/a.txt"));
        assert!(lines[1].contains("DELETED - /replica/b.txt"));
    }

    #[test]
    fn test_journal_file_is_dated() {
        let temp_dir = TempDir::new().unwrap();
        let journal = SyncJournal::create(temp_dir.path()).unwrap();

        let name = journal.path().file_name().unwrap().to_string_lossy();
        assert!(name.ends_with("_sync_log.txt"));
    }

    #[test]
    fn test_journal_create_fails_without_folder() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("nope");

        let err = SyncJournal::create(&missing).unwrap_err();
        assert!(matches!(err, SyncError::SinkUnavailable { .. }));
    }

    #[test]
    fn test_memory_sink_records_events() {
        let sink = MemorySink::new();
        sink.emit(&LogEvent::new(EventKind::Info, "started"));
        sink.emit(&LogEvent::new(EventKind::Error, "boom"));

        assert_eq!(sink.events().len(), 2);
        assert_eq!(sink.count(EventKind::Error), 1);
        assert_eq!(sink.events()[0].message, "started");
    }
}
