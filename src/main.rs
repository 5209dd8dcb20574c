/// Process studio server entry point
///
/// Reads configuration from the environment and serves:
/// - model, catalogue and process APIs at /api/*
/// - health check at /healthz

use process_studio::{config::Config, server::start_server};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Missing database settings stop us before anything binds
    let config = Config::from_env()?;

    start_server(config).await?;

    Ok(())
}
