//! File system storage management
//!
//! Handles path validation and the guarded file operations.

pub mod operations;
pub mod results;
pub mod validation;

pub use operations::{Browse, FileStore, LISTING_NOTICE};
pub use results::{
    DeleteOutcome, DirEntry, Listing, ResolvedFile, SearchHit, StoredFile, UploadRequest,
};
pub use validation::{PathResolver, resolve};
