//! Error types
//!
//! Every failure a guarded operation can produce. The `Display` strings of the
//! expected variants are safe to show to clients; the I/O and unhandled
//! variants carry server-side detail and are never rendered verbatim.

use std::io;
use thiserror::Error;

/// Why an upload was refused before anything touched the filesystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum UploadRejection {
    /// No `file` part in the request
    #[error("No file selected")]
    MissingFile,
    /// The client sent a file part without a name
    #[error("No file chosen")]
    EmptyFilename,
    /// Extension not in the configured allow-set
    #[error("File type not allowed")]
    DisallowedExtension,
    /// Content does not start with `%PDF`
    #[error("Uploaded file is not a valid PDF.")]
    NotPdf,
    /// Nothing usable left after sanitizing the name
    #[error("Invalid file name")]
    UnsafeFilename,
    /// Larger than the configured maximum
    #[error("File exceeds the maximum upload size")]
    TooLarge,
}

/// Top-level error for every store, auth, and boundary operation.
#[derive(Debug, Error)]
pub enum ShelfError {
    /// Path escapes the root, or names nothing readable inside it
    #[error("Forbidden")]
    Forbidden,

    #[error("Invalid username or password.")]
    InvalidCredentials,

    #[error("Login required")]
    NotAuthenticated,

    #[error(transparent)]
    InvalidUpload(#[from] UploadRejection),

    #[error("I/O failure: {0}")]
    IoFailure(#[from] io::Error),

    #[error("Unhandled error: {0}")]
    Unhandled(String),
}

impl ShelfError {
    /// Whether the error is an expected, locally recovered outcome.
    pub fn is_expected(&self) -> bool {
        !matches!(self, ShelfError::IoFailure(_) | ShelfError::Unhandled(_))
    }
}
