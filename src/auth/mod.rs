//! Authentication system
//!
//! Handles credential parsing, login validation, and session gating.

pub mod credentials;
pub mod session;
pub mod validator;

pub use credentials::CredentialStore;
pub use session::Session;
pub use validator::{authenticate, require_session};
