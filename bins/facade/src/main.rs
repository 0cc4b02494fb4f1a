mod config;
mod error;
mod retry;
mod routes;

use std::future::Future;

use axum::Router;
use clap::Parser;
use tokio::net::TcpListener;

use config::{Cli, FacadeConfig};
use error::FacadeError;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        tracing::error!(error = %e, "facade failed");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), FacadeError> {
    let config = match &cli.config {
        Some(path) => FacadeConfig::load(path)?,
        None => FacadeConfig::default(),
    };
    tracing::info!(
        logging = %config.logging_url,
        messages = %config.messages_url,
        "facade configured"
    );

    let app = routes::router(routes::AppState::new(&config)?);
    let listener = TcpListener::bind(&config.listen)
        .await
        .map_err(|source| FacadeError::Bind { addr: config.listen.clone(), source })?;
    tracing::info!(addr = %config.listen, "facade listening");

    serve(listener, app, logging_api_server::shutdown_signal()).await
}

/// Serve until `shutdown` resolves. A failed `shutdown` also stops the server.
async fn serve<S>(listener: TcpListener, app: Router, shutdown: S) -> Result<(), FacadeError>
where
    S: Future<Output = Result<(), std::io::Error>> + Send + 'static,
{
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            match shutdown.await {
                Ok(()) => tracing::info!("shutting down..."),
                Err(e) => tracing::error!(error = %e, "failed to wait for shutdown signal, shutting down"),
            }
        })
        .await?;
    Ok(())
}
