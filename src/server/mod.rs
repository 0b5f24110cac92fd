//! Server core functionality
//!
//! Shared state, routing, session registry and route handlers for the HTTP
//! boundary.

pub mod core;
pub mod handlers;
pub mod sessions;

pub use core::{Server, build_router};
pub use sessions::SessionRegistry;

use std::sync::Arc;

use crate::auth::CredentialStore;
use crate::events::EventSink;
use crate::storage::FileStore;

/// Shared server state injected into all handlers.
///
/// Credentials and the store are fixed at startup; only the session registry
/// changes while the server runs.
#[derive(Clone)]
pub struct AppState {
    pub(crate) store: Arc<FileStore>,
    pub(crate) credentials: Arc<CredentialStore>,
    pub(crate) sessions: SessionRegistry,
    pub(crate) events: Arc<dyn EventSink>,
    pub(crate) items_per_page: usize,
}

impl AppState {
    pub fn new(store: FileStore, credentials: CredentialStore, items_per_page: usize) -> Self {
        let events = Arc::clone(store.events());
        Self {
            store: Arc::new(store),
            credentials: Arc::new(credentials),
            sessions: SessionRegistry::new(),
            events,
            items_per_page,
        }
    }
}
