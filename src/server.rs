// Process lifecycle helpers for the HTTP server

/// Resolves on Ctrl-C or SIGTERM. A handler that fails to install never
/// fires, so startup does not turn into an immediate shutdown.
pub async fn shutdown_signal() {
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
        _ = ctrl_c => tracing::info!("Received Ctrl+C, shutting down"),
        _ = terminate => tracing::info!("Received SIGTERM, shutting down"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[cfg(unix)]
    #[tokio::test]
    async fn test_waits_for_sigterm() {
        // Keep SIGTERM away from the default handler for the whole process
        let _guard =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()).unwrap();

        let shutdown = tokio::spawn(shutdown_signal());

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(!shutdown.is_finished(), "resolved without a signal");

        let status = std::process::Command::new("kill")
            .arg("-TERM")
            .arg(std::process::id().to_string())
            .status()
            .unwrap();
        assert!(status.success());

        tokio::time::timeout(Duration::from_secs(5), shutdown)
            .await
            .expect("SIGTERM should trigger shutdown")
            .unwrap();
    }
}
