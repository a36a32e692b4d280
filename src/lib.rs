//! PR Reviewer - reviewer assignment for a lightweight code-review workflow.
//!
//! Tracks teams, users and pull requests, assigns reviewers at random from
//! the author's team and exposes it all as a small JSON API.

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod repository;
pub mod services;

use std::sync::Arc;

use api::AppState;
use config::ServerConfig;
use error::AppError;
use repository::SqliteStore;
use services::ThreadRandom;

/// Open the database, build the services and serve the API until Ctrl-C.
pub async fn run(config: ServerConfig) -> Result<(), AppError> {
    let pool = db::initialize(&config.database_path).await?;
    let store = Arc::new(SqliteStore::new(pool.clone()));
    let app = api::build_router(AppState::new(store, Arc::new(ThreadRandom)));

    let addr = config.bind_addr().await?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind to {}: {}", addr, e)))?;

    log::info!("[server] Listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| AppError::internal(format!("Server error: {}", e)))?;

    pool.close().await;
    log::info!("[server] Stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("[server] Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
    log::info!("[server] Shutting down");
}
