//! Storage operations
//!
//! Guarded list, read, write and delete over the storage root. Every operation
//! resolves its path first and fails with `Forbidden` before touching the
//! filesystem if the path escapes the root. Writes and deletes additionally
//! require a logged-in session.
//!
//! There is no locking: concurrent writers to the same file race and the last
//! rename wins, and a delete may remove a file another request is reading.
//! Every writer stages into its own temp file, so the file that lands is
//! always one complete upload.

use log::{debug, info, warn};
use std::collections::HashSet;
use std::fs;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use tempfile::NamedTempFile;
use walkdir::WalkDir;

use crate::auth::{Session, require_session};
use crate::error::{ShelfError, UploadRejection};
use crate::events::{EventKind, EventSink};
use crate::storage::results::{
    DeleteOutcome, DirEntry, Listing, ResolvedFile, SearchHit, StoredFile, UploadRequest,
};
use crate::storage::validation::{
    PathResolver, has_allowed_extension, has_pdf_signature, sanitize_filename,
};

/// Notice attached to a listing that could not be read
pub const LISTING_NOTICE: &str = "Error accessing directory.";

/// Suffix matched by the filename search
const SEARCH_SUFFIX: &str = ".pdf";

/// What a browse request landed on
#[derive(Debug)]
pub enum Browse {
    File(ResolvedFile),
    Directory(Listing),
}

pub struct FileStore {
    resolver: PathResolver,
    allowed_extensions: HashSet<String>,
    max_upload_bytes: u64,
    events: Arc<dyn EventSink>,
}

impl FileStore {
    pub fn new(
        resolver: PathResolver,
        allowed_extensions: HashSet<String>,
        max_upload_bytes: u64,
        events: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            resolver,
            allowed_extensions,
            max_upload_bytes,
            events,
        }
    }

    pub fn root(&self) -> &Path {
        self.resolver.root()
    }

    pub fn events(&self) -> &Arc<dyn EventSink> {
        &self.events
    }

    /// Reads a file, or lists a directory, at `relative`.
    pub fn browse(&self, relative: &str) -> Result<Browse, ShelfError> {
        let path = self.resolver.resolve(relative)?;
        if path.is_file() {
            return self.read(relative).map(Browse::File);
        }
        Ok(Browse::Directory(self.list_resolved(&path, relative)))
    }

    /// Lists a directory, directories first then case-insensitive by name.
    ///
    /// Unreadable or missing directories give an empty listing with a notice
    /// and an error event rather than failing the request.
    pub fn list(&self, relative: &str) -> Result<Listing, ShelfError> {
        let path = self.resolver.resolve(relative)?;
        Ok(self.list_resolved(&path, relative))
    }

    fn list_resolved(&self, dir: &Path, relative: &str) -> Listing {
        let read = match fs::read_dir(dir) {
            Ok(read) => read,
            Err(e) => {
                self.events.record(
                    EventKind::Error,
                    &format!("Failed to list directory '{}': {}", relative, e),
                );
                return Listing {
                    entries: Vec::new(),
                    notice: Some(LISTING_NOTICE.to_string()),
                };
            }
        };

        let mut entries: Vec<DirEntry> = read
            .flatten()
            .map(|entry| {
                let full = entry.path();
                DirEntry {
                    name: entry.file_name().to_string_lossy().into_owned(),
                    path: self.resolver.to_relative(&full),
                    is_dir: full.is_dir(),
                }
            })
            .collect();

        entries.sort_by(|a, b| {
            b.is_dir
                .cmp(&a.is_dir)
                .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
        });

        debug!("Listed '{}' - {} entries", relative, entries.len());

        Listing {
            entries,
            notice: None,
        }
    }

    /// Resolves a regular file for streaming.
    ///
    /// A missing file is reported exactly like a path outside the root.
    pub fn read(&self, relative: &str) -> Result<ResolvedFile, ShelfError> {
        let path = self.resolver.resolve(relative)?;
        match fs::metadata(&path) {
            Ok(meta) if meta.is_file() => Ok(ResolvedFile {
                path,
                len: meta.len(),
            }),
            _ => Err(ShelfError::Forbidden),
        }
    }

    /// Stores an uploaded PDF.
    ///
    /// All checks run before any directory is created: size, extension,
    /// `%PDF` signature, sanitized name, destination inside the root.
    pub fn write(&self, session: &Session, request: UploadRequest) -> Result<StoredFile, ShelfError> {
        let username = require_session(session)?;

        if request.filename.is_empty() {
            return Err(UploadRejection::EmptyFilename.into());
        }
        if request.bytes.len() as u64 > self.max_upload_bytes {
            return Err(UploadRejection::TooLarge.into());
        }
        if !has_allowed_extension(&request.filename, &self.allowed_extensions) {
            return Err(UploadRejection::DisallowedExtension.into());
        }
        if !has_pdf_signature(&request.bytes) {
            return Err(UploadRejection::NotPdf.into());
        }

        let filename = sanitize_filename(&request.filename)
            .filter(|name| has_allowed_extension(name, &self.allowed_extensions))
            .ok_or(UploadRejection::UnsafeFilename)?;

        let target = match request.new_folder.as_deref().map(str::trim) {
            Some(folder) if !folder.is_empty() => folder,
            _ => request.target_path.as_str(),
        };

        let dest_dir = self.resolver.resolve(target)?;
        let dest_file = self
            .resolver
            .resolve(&self.resolver.to_relative(&dest_dir.join(&filename)))?;

        fs::create_dir_all(&dest_dir)?;

        // Each upload gets its own temp file; dropped on failure.
        let mut staged = NamedTempFile::new_in(&dest_dir)?;
        staged.write_all(&request.bytes)?;
        staged.flush()?;
        staged.persist(&dest_file).map_err(|e| e.error)?;

        let directory = self.resolver.to_relative(&dest_dir);
        self.events.record(
            EventKind::Upload,
            &format!(
                "User '{}' uploaded file '{}' to '{}'",
                username, filename, directory
            ),
        );

        Ok(StoredFile {
            path: self.resolver.to_relative(&dest_file),
            filename,
            directory,
        })
    }

    /// Deletes a file, or a directory with everything below it.
    ///
    /// Directories are removed recursively without confirmation. A path that
    /// names nothing is a benign `Missing` outcome. The audit entry is written
    /// in every non-error case. The root itself cannot be deleted.
    pub fn delete(&self, session: &Session, relative: &str) -> Result<DeleteOutcome, ShelfError> {
        let username = require_session(session)?;
        let path = self.resolver.resolve(relative)?;

        // A link is removed itself, never the tree it points at.
        let unresolved = self.resolver.unresolved(relative)?;
        if is_symlink(&unresolved) {
            fs::remove_file(&unresolved).or_else(|_| fs::remove_dir(&unresolved))?;
            self.record_delete(username, &unresolved);
            return Ok(DeleteOutcome::FileRemoved);
        }

        if path == self.resolver.root() {
            warn!("User '{}' attempted to delete the storage root", username);
            return Err(ShelfError::Forbidden);
        }

        let outcome = match fs::metadata(&path) {
            Ok(meta) if meta.is_dir() => {
                fs::remove_dir_all(&path)?;
                DeleteOutcome::DirectoryRemoved
            }
            Ok(_) => {
                fs::remove_file(&path)?;
                DeleteOutcome::FileRemoved
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => DeleteOutcome::Missing,
            Err(e) => return Err(e.into()),
        };

        self.record_delete(username, &path);
        Ok(outcome)
    }

    fn record_delete(&self, username: &str, path: &Path) {
        self.events.record(
            EventKind::Delete,
            &format!(
                "User '{}' deleted '{}'",
                username,
                self.resolver.to_relative(path)
            ),
        );
    }

    /// Case-insensitive filename search over every `.pdf` below the root.
    ///
    /// Only names are matched; file contents are never opened.
    pub fn search(&self, query: &str) -> Vec<SearchHit> {
        let needle = query.to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }

        let mut hits: Vec<SearchHit> = WalkDir::new(self.root())
            .into_iter()
            .filter_map(|entry| {
                entry
                    .map_err(|e| debug!("Skipping unreadable entry during search: {}", e))
                    .ok()
            })
            .filter(|entry| entry.file_type().is_file())
            .filter_map(|entry| {
                let name = entry.file_name().to_string_lossy().into_owned();
                let lower = name.to_lowercase();
                (lower.ends_with(SEARCH_SUFFIX) && lower.contains(&needle)).then(|| SearchHit {
                    path: self.resolver.to_relative(entry.path()),
                    name,
                })
            })
            .collect();

        hits.sort_by(|a, b| a.path.cmp(&b.path));
        info!("Search for {:?} matched {} files", query, hits.len());
        hits
    }

    /// Immediate subdirectories of the root, sorted; empty on failure.
    pub fn subdirectories(&self) -> Vec<String> {
        let mut dirs: Vec<String> = match fs::read_dir(self.root()) {
            Ok(read) => read
                .flatten()
                .filter(|entry| entry.path().is_dir())
                .map(|entry| entry.file_name().to_string_lossy().into_owned())
                .collect(),
            Err(e) => {
                warn!("Failed to read storage root: {}", e);
                Vec::new()
            }
        };
        dirs.sort_by_key(|name| name.to_lowercase());
        dirs
    }
}

fn is_symlink(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok_and(|meta| meta.file_type().is_symlink())
}
