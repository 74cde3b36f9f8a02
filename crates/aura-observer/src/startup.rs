//! Operator server startup helper for embedding in the engine binary.
//!
//! [`spawn_observer`] binds eagerly, so a taken port fails startup, then
//! serves on a background Tokio task.

use std::future::Future;
use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::server::{ServerConfig, ServerError};
use crate::state::AppState;

/// Errors that can occur when spawning the operator server.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    /// The server failed to bind or start.
    #[error("server start error: {0}")]
    Server(#[from] ServerError),
}

/// Bind `config` and serve on a background task until `shutdown` resolves.
///
/// # Errors
///
/// Returns [`StartupError::Server`] if the address is invalid or the
/// port cannot be bound.
pub async fn spawn_observer(
    config: &ServerConfig,
    state: Arc<AppState>,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<JoinHandle<()>, StartupError> {
    let listener = crate::server::bind(config).await?;

    let handle = tokio::spawn(async move {
        if let Err(e) = crate::server::serve(listener, state, shutdown).await {
            tracing::error!(error = %e, "Operator server exited with error");
        }
    });

    tracing::info!(host = %config.host, port = config.port, "Operator server spawned");
    Ok(handle)
}
