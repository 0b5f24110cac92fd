//! Panic boundary
//!
//! A handler that panics is answered like any other unexpected failure: the
//! detail goes to the audit trail and the client gets a generic 500.

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use futures_util::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;

use crate::error::ShelfError;
use crate::server::AppState;

pub async fn catch_panic(State(state): State<AppState>, request: Request, next: Next) -> Response {
    match AssertUnwindSafe(next.run(request)).catch_unwind().await {
        Ok(response) => response,
        Err(payload) => state.reject(ShelfError::Unhandled(format!(
            "handler panicked: {}",
            panic_detail(payload.as_ref())
        ))),
    }
}

fn panic_detail(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
