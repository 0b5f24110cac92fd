//! File-backed event sink with age-based rotation.
//!
//! Entries are appended to `<log_dir>/app.log`. Once the file is older than the
//! rotation interval it is truncated on the next write; no backups are kept.

use super::{EventKind, EventSink, LogEntry, mirror};
use log::{info, warn};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{Duration, SystemTime};

const LOG_FILE_NAME: &str = "app.log";

struct LogFile {
    file: File,
    rollover_at: SystemTime,
}

pub struct FileEventLog {
    path: PathBuf,
    interval: Duration,
    state: Mutex<LogFile>,
}

impl FileEventLog {
    /// Open (or create) the log file inside `log_dir`.
    pub fn open(log_dir: &Path, interval: Duration) -> io::Result<Self> {
        fs::create_dir_all(log_dir)?;
        let path = log_dir.join(LOG_FILE_NAME);
        let file = OpenOptions::new().create(true).append(true).open(&path)?;

        // An existing file keeps counting from its last modification.
        let started = file
            .metadata()
            .and_then(|meta| meta.modified())
            .unwrap_or_else(|_| SystemTime::now());

        info!("Event log: {}", path.display());

        Ok(Self {
            path,
            interval,
            state: Mutex::new(LogFile {
                file,
                rollover_at: started + interval,
            }),
        })
    }

    fn append(&self, entry: &LogEntry) -> io::Result<()> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| io::Error::other("event log lock poisoned"))?;

        let now = SystemTime::now();
        if now >= state.rollover_at {
            state.file.set_len(0)?;
            state.rollover_at = now + self.interval;
            info!("Rotated event log {}", self.path.display());
        }

        writeln!(state.file, "{}", entry)?;
        state.file.flush()
    }
}

impl EventSink for FileEventLog {
    fn record(&self, kind: EventKind, message: &str) {
        let entry = LogEntry::now(kind, message);
        mirror(&entry);
        if let Err(e) = self.append(&entry) {
            warn!("Failed to write event log {}: {}", self.path.display(), e);
        }
    }

    fn lines(&self) -> io::Result<Vec<String>> {
        let contents = fs::read_to_string(&self.path)?;
        Ok(contents.lines().map(str::to_string).collect())
    }
}
