use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use logging_engine::{LoggingConfig, LoggingService, ServiceOptions, StoreHandle};

use crate::config::ServeArgs;
use crate::error::ServerError;

/// How long in-flight requests get to finish after a shutdown signal.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

pub async fn run(args: ServeArgs) -> Result<(), ServerError> {
    // --- Load config ---
    let config = match &args.config {
        Some(path) => {
            let config = LoggingConfig::load(path)?;
            tracing::info!(config = %path, "loaded config");
            config
        }
        None => LoggingConfig::default(),
    };
    let addr = config.listen_addr()?;

    // --- Acquire the store handle ---
    let handle = StoreHandle::open(&config.store, args.num).await?;
    let service = Arc::new(LoggingService::new(
        handle.store(),
        ServiceOptions {
            request_timeout: config.request_timeout(),
        },
    ));

    // --- Serve, then release the handle whatever the outcome ---
    let served = match TcpListener::bind(addr).await {
        Ok(listener) => serve_until(listener, service, logging_api_server::shutdown_signal()).await,
        Err(source) => Err(logging_api_server::ServerError::Bind { addr, source }.into()),
    };
    let released = handle.release().await;

    served?;
    released?;
    tracing::info!("shutdown complete");
    Ok(())
}

/// Serve until `shutdown` resolves, then drain. A failed `shutdown` still
/// stops the server before its error is returned.
async fn serve_until<S>(
    listener: TcpListener,
    service: Arc<LoggingService>,
    shutdown: S,
) -> Result<(), ServerError>
where
    S: Future<Output = Result<(), std::io::Error>>,
{
    let token = CancellationToken::new();
    let mut api = tokio::spawn(logging_api_server::serve(listener, service, token.clone()));

    let signal = tokio::select! {
        result = &mut api => {
            // The server only returns on its own if it failed.
            result??;
            return Ok(());
        }
        signal = shutdown => signal,
    };
    match &signal {
        Ok(()) => tracing::info!("shutting down..."),
        Err(e) => tracing::error!(error = %e, "failed to wait for shutdown signal, shutting down"),
    }

    token.cancel();
    match tokio::time::timeout(DRAIN_TIMEOUT, &mut api).await {
        Ok(result) => result??,
        Err(_) => {
            tracing::warn!(timeout = ?DRAIN_TIMEOUT, "requests still in flight, aborting");
            api.abort();
        }
    }

    signal?;
    Ok(())
}
