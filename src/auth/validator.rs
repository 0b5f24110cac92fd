//! Authentication validator
//!
//! Login checks and the guard every protected operation runs first.

use super::credentials::CredentialStore;
use super::session::Session;
use crate::error::ShelfError;
use log::{info, warn};

const MAX_CREDENTIAL_LENGTH: usize = 256;

/// Basic input sanitation for usernames and passwords.
fn is_valid_input(input: &str) -> bool {
    !input.trim().is_empty()
        && input.len() <= MAX_CREDENTIAL_LENGTH
        && !input.contains(['\r', '\n', '\0'])
}

/// Logs a user in.
///
/// Succeeds only on an exact match of both fields. Unknown users, wrong
/// passwords and malformed input all produce the same error so a caller
/// cannot probe which usernames exist.
pub fn authenticate(
    store: &CredentialStore,
    username: &str,
    password: &str,
) -> Result<Session, ShelfError> {
    if is_valid_input(username) && is_valid_input(password) && store.matches(username, password) {
        info!("User '{}' logged in", username);
        Ok(Session::authenticated(username))
    } else {
        warn!("Rejected login attempt");
        Err(ShelfError::InvalidCredentials)
    }
}

/// Guard for protected operations; yields the acting username.
pub fn require_session(session: &Session) -> Result<&str, ShelfError> {
    match session.username() {
        Some(username) if session.is_logged_in() => Ok(username),
        _ => Err(ShelfError::NotAuthenticated),
    }
}
