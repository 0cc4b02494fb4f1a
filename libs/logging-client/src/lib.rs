//! Typed client for the logging RPC surface.

use std::time::Duration;

use reqwest::StatusCode;

use logging_api::rpc::{
    ADD_LOG_PATH, AddLogResponse, GET_LOGS_PATH, GetLogsRequest, Log, LogsString, RpcCode,
    RpcStatus,
};

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("log already exists: {0}")]
    AlreadyExists(String),

    #[error("invalid request: {0}")]
    InvalidArgument(String),

    #[error("logging service internal error: {0}")]
    Internal(String),

    #[error("logging service unavailable: {0}")]
    Unavailable(#[from] reqwest::Error),

    #[error("unexpected response {status}: {body}")]
    Unexpected { status: StatusCode, body: String },
}

impl ClientError {
    /// Whether sending the same request again can change the outcome.
    pub fn is_retryable(&self) -> bool {
        match self {
            ClientError::Internal(_) | ClientError::Unavailable(_) => true,
            ClientError::Unexpected { status, .. } => status.is_server_error(),
            ClientError::AlreadyExists(_) | ClientError::InvalidArgument(_) => false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoggingClient {
    http: reqwest::Client,
    base_url: String,
}

impl LoggingClient {
    /// `timeout` bounds both connecting and each whole call.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .connect_timeout(timeout)
            .timeout(timeout)
            .tcp_keepalive(Duration::from_secs(30))
            .build()?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn add_log(&self, log: &Log) -> Result<AddLogResponse, ClientError> {
        let response = self
            .http
            .post(format!("{}{ADD_LOG_PATH}", self.base_url))
            .json(log)
            .send()
            .await?;
        decode(response).await
    }

    pub async fn get_logs(&self) -> Result<String, ClientError> {
        let response = self
            .http
            .post(format!("{}{GET_LOGS_PATH}", self.base_url))
            .json(&GetLogsRequest::default())
            .send()
            .await?;
        let logs: LogsString = decode(response).await?;
        Ok(logs.logs_string)
    }
}

async fn decode<T: serde::de::DeserializeOwned>(response: reqwest::Response) -> Result<T, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response.json().await?);
    }

    let body = response.text().await?;
    match serde_json::from_str::<RpcStatus>(&body) {
        Ok(rpc) => {
            tracing::debug!(%status, code = %rpc.code, message = %rpc.message, "call rejected");
            Err(match rpc.code {
                RpcCode::AlreadyExists => ClientError::AlreadyExists(rpc.message),
                RpcCode::InvalidArgument => ClientError::InvalidArgument(rpc.message),
                RpcCode::Internal => ClientError::Internal(rpc.message),
            })
        }
        Err(_) => Err(ClientError::Unexpected { status, body }),
    }
}
