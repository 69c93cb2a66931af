//! HTTP server lifecycle: bind, spawn the axum serve loop in a
//! background task, hand back a handle with a shutdown channel.

use std::net::SocketAddr;

use tokio::sync::oneshot;

use crate::api::error::ApiError;
use crate::api::router::api_router;
use crate::api::types::ApiContext;

/// Handle to a running API server.
pub struct ApiServer {
    pub addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl ApiServer {
    /// Bind `addr` and start serving in a background task.
    pub async fn start(ctx: ApiContext, addr: SocketAddr) -> Result<Self, ApiError> {
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| ApiError::Internal(format!("failed to bind {addr}: {e}")))?;
        let addr = listener
            .local_addr()
            .map_err(|e| ApiError::Internal(format!("failed to read bound address: {e}")))?;

        let app = api_router(ctx);
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        tokio::spawn(async move {
            let shutdown_signal = async move {
                let _ = shutdown_rx.await;
                tracing::info!("shutdown signal received");
            };

            tracing::info!(%addr, "API server started");
            if let Err(e) = axum::serve(listener, app)
                .with_graceful_shutdown(shutdown_signal)
                .await
            {
                tracing::error!("API server error: {e}");
            }
            tracing::info!("API server stopped");
        });

        Ok(Self {
            addr,
            shutdown_tx: Some(shutdown_tx),
        })
    }

    /// Signal the serve loop to drain and exit. Safe to call twice.
    pub fn shutdown(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}
