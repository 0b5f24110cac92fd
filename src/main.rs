//! pdf-shelf - Entry Point
//!
//! Authenticated upload, browse, search and deletion of PDF documents.

use log::{error, info};

use pdf_shelf::Server;
use pdf_shelf::config::AppConfig;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Initialize the logger (env_logger picks up RUST_LOG environment variable)
    env_logger::init();

    let config = AppConfig::load().map_err(|e| {
        error!("Invalid configuration: {}", e);
        e
    })?;

    info!("Launching pdf-shelf...");

    let server = Server::new(config).await?;
    server.start().await
}
