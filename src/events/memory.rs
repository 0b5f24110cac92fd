//! In-memory event sink for tests and embedders that keep no log file.

use super::{EventKind, EventSink, LogEntry, mirror};
use std::io;
use std::sync::Mutex;

#[derive(Default)]
pub struct MemoryEventLog {
    entries: Mutex<Vec<LogEntry>>,
}

impl MemoryEventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every recorded entry.
    pub fn entries(&self) -> Vec<LogEntry> {
        match self.entries.lock() {
            Ok(entries) => entries.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl EventSink for MemoryEventLog {
    fn record(&self, kind: EventKind, message: &str) {
        let entry = LogEntry::now(kind, message);
        mirror(&entry);
        match self.entries.lock() {
            Ok(mut entries) => entries.push(entry),
            Err(poisoned) => poisoned.into_inner().push(entry),
        }
    }

    fn lines(&self) -> io::Result<Vec<String>> {
        Ok(self.entries().iter().map(ToString::to_string).collect())
    }
}
