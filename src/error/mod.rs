//! Error handling
//!
//! Defines the error taxonomy and how each kind surfaces to clients.

pub mod handlers;
pub mod types;

pub use types::*;
