//! Observer HTTP server lifecycle.
//!
//! [`start_server`] binds and serves in the current task;
//! [`spawn_observer`] does the same on a background task so the caller can
//! go on to run the initial load.

use std::net::SocketAddr;
use std::sync::Arc;

use icarus_core::config::ServerConfig;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::router::build_router;
use crate::state::AppState;

/// Observer startup and runtime failures.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// `host:port` from the config is not a socket address.
    #[error("invalid listen address {addr}: {reason}")]
    InvalidAddress {
        /// The rejected `host:port` text.
        addr: String,
        /// Parser message.
        reason: String,
    },

    /// The address is valid but could not be bound (in use, no permission).
    #[error("cannot listen on {addr}: {source}")]
    Bind {
        /// Address we tried to bind.
        addr: SocketAddr,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Accepting or serving connections failed.
    #[error("observer server failed: {0}")]
    Serve(#[source] std::io::Error),
}

/// Parse `host:port` from the config.
fn socket_addr(config: &ServerConfig) -> Result<SocketAddr, ServerError> {
    let addr = format!("{}:{}", config.host, config.port);
    addr.parse().map_err(|e: std::net::AddrParseError| ServerError::InvalidAddress {
        reason: e.to_string(),
        addr,
    })
}

async fn bind(config: &ServerConfig) -> Result<TcpListener, ServerError> {
    let addr = socket_addr(config)?;
    TcpListener::bind(addr)
        .await
        .map_err(|source| ServerError::Bind { addr, source })
}

/// Bind the configured address and serve in the current task.
///
/// # Errors
///
/// Fails if the address does not parse or bind, or if serving stops with
/// an I/O error.
pub async fn start_server(config: &ServerConfig, state: Arc<AppState>) -> Result<(), ServerError> {
    let listener = bind(config).await?;
    serve(listener, state).await
}

/// Serve on an already bound listener.
///
/// # Errors
///
/// Returns [`ServerError::Serve`] if the server hits a fatal I/O error.
pub async fn serve(listener: TcpListener, state: Arc<AppState>) -> Result<(), ServerError> {
    match listener.local_addr() {
        Ok(addr) => info!(%addr, "Observer listening"),
        Err(e) => warn!(error = %e, "Observer listening on an unknown address"),
    }

    axum::serve(listener, build_router(state))
        .await
        .map_err(ServerError::Serve)
}

/// Bind now, then serve on a background task.
///
/// Binding happens before spawning so that an address already in use is
/// reported to the caller instead of only being logged.
///
/// # Errors
///
/// Returns [`ServerError::InvalidAddress`] or [`ServerError::Bind`] when
/// the listener cannot be set up.
pub async fn spawn_observer(
    config: &ServerConfig,
    state: Arc<AppState>,
) -> Result<JoinHandle<()>, ServerError> {
    let listener = bind(config).await?;

    let handle = tokio::spawn(async move {
        if let Err(e) = serve(listener, state).await {
            error!(error = %e, "Observer server exited with error");
        }
    });
    Ok(handle)
}
