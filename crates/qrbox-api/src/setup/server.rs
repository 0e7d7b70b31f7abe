//! Server startup and graceful shutdown

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use axum::Router;
use qrbox_core::Config;

use crate::state::AppState;

/// Start the server with graceful shutdown.
///
/// After the listener stops, in-flight detection runs are drained with a
/// bounded grace period and the pool is closed.
pub async fn start_server(config: &Config, app: Router, state: Arc<AppState>) -> Result<()> {
    let addr = format!("0.0.0.0:{}", config.server_port);
    tracing::info!(addr = %addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(&addr).await?;

    let max_file_mb = config.max_file_size_bytes / 1024 / 1024;
    tracing::info!(
        max_file_mb,
        extensions = %config.allowed_extensions.join(","),
        detection_workers = config.detection_max_workers,
        upload_dir = %config.upload_dir,
        environment = %config.environment,
        "Server ready and accepting connections"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    state
        .queue
        .shutdown(Duration::from_secs(config.shutdown_grace_seconds))
        .await;
    state.pool.close().await;
    tracing::info!("Shutdown complete");

    Ok(())
}

/// Signal handler for graceful shutdown
///
/// Listens for Ctrl+C (SIGINT) and SIGTERM signals to initiate graceful shutdown.
///
/// # Panics
/// - Panics if the Ctrl+C signal handler cannot be installed (unrecoverable system error)
/// - On Unix systems, panics if the SIGTERM handler cannot be installed
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            tracing::info!("Received terminate signal");
        },
    }

    tracing::info!("Shutting down gracefully...");
}
