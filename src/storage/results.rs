//! Storage result types
//!
//! Defines result structures returned by storage operations.

use serde::Serialize;
use std::path::PathBuf;

/// One entry of a directory listing
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct DirEntry {
    pub name: String,
    /// Path relative to the storage root, usable as the next `path` query
    pub path: String,
    pub is_dir: bool,
}

/// Result of a directory listing operation
#[derive(Debug, Clone, Serialize, Default)]
pub struct Listing {
    pub entries: Vec<DirEntry>,
    /// Set when the directory could not be read; `entries` is then empty
    pub notice: Option<String>,
}

impl Listing {
    /// One page of entries, 1-based; pages past the end are empty.
    pub fn page(&self, page: usize, per_page: usize) -> &[DirEntry] {
        let start = page.saturating_sub(1).saturating_mul(per_page);
        if start >= self.entries.len() {
            return &[];
        }
        let end = start.saturating_add(per_page).min(self.entries.len());
        &self.entries[start..end]
    }
}

/// A file proven readable and inside the root
#[derive(Debug, Clone)]
pub struct ResolvedFile {
    pub path: PathBuf,
    pub len: u64,
}

/// An upload as received from the client
#[derive(Debug, Clone, Default)]
pub struct UploadRequest {
    /// Existing destination directory chosen by the client
    pub target_path: String,
    /// New folder name; overrides `target_path` when non-blank
    pub new_folder: Option<String>,
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// Result of a successful upload
#[derive(Debug, Clone, Serialize)]
pub struct StoredFile {
    pub filename: String,
    /// Destination directory relative to the root
    pub directory: String,
    /// Full stored path relative to the root
    pub path: String,
}

/// Result of a delete request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeleteOutcome {
    FileRemoved,
    DirectoryRemoved,
    /// Nothing existed at the path; not an error
    Missing,
}

/// A filename search hit
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SearchHit {
    pub name: String,
    pub path: String,
}
