//! Error handlers
//!
//! Decides how each error surfaces: status code, client-facing message, and
//! whether it lands in the audit trail.

use crate::error::types::{ShelfError, UploadRejection};
use crate::events::{EventKind, EventSink};
use axum::http::StatusCode;
use log::info;

/// Shown to clients for failures whose detail stays server-side
pub const GENERIC_FAILURE: &str = "An internal error occurred.";

/// Record an error. Unexpected failures go to the audit trail in full.
pub fn handle_error(err: &ShelfError, events: &dyn EventSink) {
    if err.is_expected() {
        info!("Request rejected: {}", err);
    } else {
        events.record(EventKind::Error, &err.to_string());
    }
}

/// Convert error to HTTP status code
pub fn error_to_status(err: &ShelfError) -> StatusCode {
    match err {
        ShelfError::Forbidden => StatusCode::FORBIDDEN,
        ShelfError::InvalidCredentials => StatusCode::UNAUTHORIZED,
        ShelfError::NotAuthenticated => StatusCode::SEE_OTHER,
        ShelfError::InvalidUpload(UploadRejection::TooLarge) => StatusCode::PAYLOAD_TOO_LARGE,
        ShelfError::InvalidUpload(_) => StatusCode::BAD_REQUEST,
        ShelfError::IoFailure(_) | ShelfError::Unhandled(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Message safe to show the client.
pub fn client_message(err: &ShelfError) -> String {
    if err.is_expected() {
        err.to_string()
    } else {
        GENERIC_FAILURE.to_string()
    }
}
