//! OS signal handling.

use tokio::sync::broadcast;

/// Resolves on Ctrl+C, SIGTERM (unix), or a [`Shutdown`](super::Shutdown)
/// broadcast, whichever comes first. Dropping the [`Shutdown`](super::Shutdown)
/// itself also resolves it.
pub async fn shutdown_signal(mut shutdown: broadcast::Receiver<()>) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Shutdown signal received"),
        _ = terminate => tracing::info!("SIGTERM received"),
        _ = shutdown.recv() => tracing::info!("Shutdown requested"),
    }
}
