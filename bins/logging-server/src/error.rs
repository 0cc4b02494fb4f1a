#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("{0}")]
    Logging(#[from] logging_engine::LoggingError),

    #[error("api: {0}")]
    Api(#[from] logging_api_server::ServerError),

    #[error("api task: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("signal: {0}")]
    Signal(#[from] std::io::Error),
}
