use std::sync::Arc;

use anyhow::{Context, Result};
use wanderher_core::{Config, MistralClient};

use crate::routes;
use crate::state::AppState;

/// Start the HTTP relay and run until Ctrl-C.
pub async fn serve(config: Config) -> Result<()> {
    let api_key = config.api_key();
    if api_key.is_empty() {
        tracing::warn!("MISTRAL_API_KEY is not set; chat requests will fail upstream");
    }

    let provider = MistralClient::with_base_url(&api_key, &config.base_url());
    let app = routes::create_router(AppState::new(Arc::new(provider)));

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
