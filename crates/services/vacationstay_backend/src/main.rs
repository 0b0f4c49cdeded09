// File: services/vacationstay_backend/src/main.rs
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::info;
use vacationstay_backend::{build_app, AppState};
use vacationstay_common::{config_error, logging, Context, VacationStayError};
use vacationstay_config::{ensure_dotenv_loaded, load_config};

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> Result<(), VacationStayError> {
    ensure_dotenv_loaded();
    let config = Arc::new(load_config().map_err(config_error)?);

    // Flushes the file log on drop; keep it for the whole run.
    let _log_guard = logging::init_from_config(&config.logging);

    let state = AppState::new(config.clone()).await?;
    let app = build_app(&state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Starting server at http://{}", addr);
    info!("API endpoints available at http://{}/api", addr);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;
    Ok(())
}
