use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::routing::{get, post};
use log::{error, info};
use std::error::Error;
use std::sync::Arc;
use tokio::net::TcpListener;

use crate::auth::CredentialStore;
use crate::config::AppConfig;
use crate::events::{EventSink, FileEventLog};
use crate::middleware::{catch_panic, log_request};
use crate::server::AppState;
use crate::server::handlers;
use crate::storage::{FileStore, PathResolver};

/// Room for multipart boundaries and the text fields next to the file.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

pub type BoxError = Box<dyn Error + Send + Sync>;

pub struct Server {
    listener: TcpListener,
    router: Router,
    config: Arc<AppConfig>,
}

impl Server {
    /// Prepares the storage root, event log and listener.
    pub async fn new(config: AppConfig) -> Result<Self, BoxError> {
        let resolver = PathResolver::new(&config.upload_folder_path())?;
        info!("Storage root: {}", resolver.root().display());

        let events: Arc<dyn EventSink> = Arc::new(FileEventLog::open(
            &config.log_dir_path(),
            config.log_rotation_interval(),
        )?);

        let credentials = CredentialStore::parse(&config.admin_users);
        info!("Loaded {} admin credential(s)", credentials.len());

        let store = FileStore::new(
            resolver,
            config.allowed_extension_set(),
            config.max_upload_size_bytes(),
            events,
        );
        let state = AppState::new(store, credentials, config.items_per_page);
        let body_limit = usize::try_from(config.max_upload_size_bytes())
            .unwrap_or(usize::MAX)
            .saturating_add(MULTIPART_OVERHEAD);
        let router = build_router(state, body_limit);

        let socket = config.listen_socket();
        let listener = match TcpListener::bind(&socket).await {
            Ok(listener) => {
                info!("Server bound to {}", socket);
                listener
            }
            Err(e) => {
                error!("Failed to bind to {}: {}", socket, e);
                return Err(e.into());
            }
        };

        Ok(Self {
            listener,
            router,
            config: Arc::new(config),
        })
    }

    pub async fn start(self) -> Result<(), BoxError> {
        info!(
            "Starting pdf-shelf on {} (max upload {} MB)",
            self.config.listen_socket(),
            self.config.max_upload_size_mb
        );

        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        info!("Server stopped");
        Ok(())
    }
}

/// All routes, with request logging, the panic boundary and the upload body
/// limit applied.
pub fn build_router(state: AppState, body_limit: usize) -> Router {
    let routes = Router::new()
        .route("/", get(handlers::index))
        .route("/view/{*path}", get(handlers::view_file))
        .route("/search", get(handlers::search))
        .route("/upload", get(handlers::upload_form).post(handlers::upload))
        .route("/delete/{*path}", post(handlers::delete))
        .route("/logs", get(handlers::view_logs))
        .route(
            handlers::LOGIN_ROUTE,
            get(handlers::login_status).post(handlers::login),
        )
        .route("/logout", get(handlers::logout).post(handlers::logout))
        .fallback(handlers::not_found);
    with_boundary(routes, state, body_limit)
}

fn with_boundary(routes: Router<AppState>, state: AppState, body_limit: usize) -> Router {
    routes
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(middleware::from_fn_with_state(state.clone(), catch_panic))
        .layer(middleware::from_fn(log_request))
        .with_state(state)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown requested");
}
