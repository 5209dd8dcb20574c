/// Server setup and initialization
///
/// Opens the gateway, wires it into the HTTP routes and serves them.

use crate::{
    api::{create_api_routes, AppState},
    config::Config,
    gateway::{Gateway, SqliteGateway},
};
use anyhow::Result;
use axum::{routing::get, Router};
use std::sync::Arc;
use tokio::net::TcpListener;

/// Create the Axum application backed by the configured database
pub async fn create_app(config: Config) -> Result<Router> {
    tracing::info!("🗄️ Connecting to database (max {} connections)", config.database.max_connections);
    let gateway = SqliteGateway::connect(&config.database)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to open database: {}", e))?;

    tracing::info!("✅ Database schema ready");
    Ok(build_router(Arc::new(gateway)))
}

/// Router over an already opened gateway
pub fn build_router(gateway: Arc<dyn Gateway>) -> Router {
    tracing::info!("📡 Creating HTTP router with all endpoints");
    Router::new()
        .route("/healthz", get(health_check))
        .merge(create_api_routes().with_state(AppState::new(gateway)))
}

/// Start the HTTP server with the given configuration
pub async fn start_server(config: Config) -> Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_thread_ids(true)
        .with_level(true)
        .init();

    tracing::info!("Starting process studio server...");

    let app = create_app(config.clone()).await?;

    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&bind_addr).await?;

    tracing::info!("Server listening on http://{}", bind_addr);

    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}

/// Health check endpoint handler
///
/// Answers "ok" while the process is serving.
async fn health_check() -> &'static str {
    "ok"
}
