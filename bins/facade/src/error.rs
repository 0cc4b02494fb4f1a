#[derive(Debug, thiserror::Error)]
pub enum FacadeError {
    #[error("config ({context}): {detail}")]
    Config { context: &'static str, detail: String },

    #[error("logging client: {0}")]
    Client(#[from] logging_client::ClientError),

    #[error("bind {addr}: {source}")]
    Bind { addr: String, source: std::io::Error },

    #[error("serve: {0}")]
    Serve(#[from] std::io::Error),
}
