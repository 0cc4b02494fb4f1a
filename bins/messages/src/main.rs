use axum::Router;
use axum::routing::get;
use clap::Parser;

#[derive(Parser)]
#[command(name = "messages", about = "Messages service placeholder")]
struct Cli {
    #[arg(long, default_value = "0.0.0.0:13227", env = "MESSAGES_LISTEN")]
    listen: String,
}

fn router() -> Router {
    Router::new().route("/", get(|| async { "Not implemented" }))
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();
    let listener = match tokio::net::TcpListener::bind(&cli.listen).await {
        Ok(l) => l,
        Err(e) => {
            tracing::error!(addr = %cli.listen, error = %e, "failed to bind");
            std::process::exit(1);
        }
    };
    tracing::info!(addr = %cli.listen, "messages service listening");

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for Ctrl+C");
        }
    };
    if let Err(e) = axum::serve(listener, router()).with_graceful_shutdown(shutdown).await {
        tracing::error!(error = %e, "server error");
        std::process::exit(1);
    }
}
