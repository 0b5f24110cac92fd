//! Audit event log
//!
//! Append-only record of uploads, deletions and errors. Only those three kinds
//! exist; everything else goes through the `log` facade and never reaches the
//! audit trail.

mod file_log;
mod memory;

pub use file_log::FileEventLog;
pub use memory::MemoryEventLog;

use chrono::{DateTime, Local};
use std::fmt;
use std::io;

/// The kinds of events persisted by the audit trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Upload,
    Delete,
    Error,
}

impl EventKind {
    /// Marker written in front of the message, e.g. `UPLOAD: ...`
    pub fn tag(&self) -> &'static str {
        match self {
            EventKind::Upload => "UPLOAD",
            EventKind::Delete => "DELETE",
            EventKind::Error => "ERROR",
        }
    }

    pub fn level(&self) -> log::Level {
        match self {
            EventKind::Upload | EventKind::Delete => log::Level::Info,
            EventKind::Error => log::Level::Error,
        }
    }
}

/// One line of the audit trail.
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub timestamp: DateTime<Local>,
    pub kind: EventKind,
    pub message: String,
}

impl LogEntry {
    pub fn now(kind: EventKind, message: &str) -> Self {
        Self {
            timestamp: Local::now(),
            kind,
            message: message.to_string(),
        }
    }
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} - {} - {}: {}",
            self.timestamp.format("%Y-%m-%d %H:%M:%S,%3f"),
            self.kind.level().as_str().to_ascii_uppercase(),
            self.kind.tag(),
            self.message
        )
    }
}

/// Destination for audit events.
///
/// Recording never fails from the caller's point of view; sinks report their
/// own write problems through the `log` facade.
pub trait EventSink: Send + Sync {
    fn record(&self, kind: EventKind, message: &str);

    /// Current contents of the trail, oldest first.
    fn lines(&self) -> io::Result<Vec<String>>;
}

/// Mirror an event to the diagnostic logger at the kind's level.
fn mirror(entry: &LogEntry) {
    log::log!(entry.kind.level(), "{}: {}", entry.kind.tag(), entry.message);
}
