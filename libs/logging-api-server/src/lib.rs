//! HTTP/JSON transport for the logging RPC surface.

mod http;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use logging_api::rpc::{ADD_LOG_PATH, GET_LOGS_PATH};
use logging_engine::LoggingService;

pub use http::ApiError;

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        source: std::io::Error,
    },

    #[error("serve: {0}")]
    Serve(#[from] std::io::Error),
}

#[derive(Clone)]
pub(crate) struct AppState {
    service: Arc<LoggingService>,
}

/// Routes of the logging service.
pub fn router(service: Arc<LoggingService>) -> Router {
    Router::new()
        .route(ADD_LOG_PATH, post(http::handle_add_log))
        .route(GET_LOGS_PATH, post(http::handle_get_logs))
        .route("/-/healthy", get(http::handle_healthy))
        .with_state(AppState { service })
}

/// Bind `addr` and serve until `shutdown` is cancelled.
pub async fn run(
    addr: SocketAddr,
    service: Arc<LoggingService>,
    shutdown: CancellationToken,
) -> Result<(), ServerError> {
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| ServerError::Bind { addr, source })?;
    serve(listener, service, shutdown).await
}

/// Serve on an already bound listener.
pub async fn serve(
    listener: TcpListener,
    service: Arc<LoggingService>,
    shutdown: CancellationToken,
) -> Result<(), ServerError> {
    if let Ok(addr) = listener.local_addr() {
        tracing::info!(%addr, "Starting server");
    }

    axum::serve(listener, router(service))
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await?;

    tracing::info!("server stopped");
    Ok(())
}

/// Resolves on SIGINT (Ctrl+C) or, on unix, SIGTERM.
pub async fn shutdown_signal() -> Result<(), std::io::Error> {
    #[cfg(unix)]
    {
        let mut terminate =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())?;
        tokio::select! {
            result = tokio::signal::ctrl_c() => result?,
            _ = terminate.recv() => tracing::info!("received SIGTERM"),
        }
    }

    #[cfg(not(unix))]
    tokio::signal::ctrl_c().await?;

    Ok(())
}
