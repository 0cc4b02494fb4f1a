use std::collections::HashMap;

use axum::Router;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use uuid::Uuid;

use logging_api::rpc::{AddLogResponse, Log};
use logging_client::{ClientError, LoggingClient};

use crate::config::FacadeConfig;
use crate::error::FacadeError;
use crate::retry::{RetryPolicy, retry};

#[derive(Clone)]
pub struct AppState {
    logging: LoggingClient,
    http: reqwest::Client,
    messages_url: String,
    retry: RetryPolicy,
}

impl AppState {
    pub fn new(config: &FacadeConfig) -> Result<Self, FacadeError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(ClientError::from)?;
        Ok(Self {
            logging: LoggingClient::new(config.logging_url.clone(), config.timeout())?,
            http,
            messages_url: config.messages_url.clone(),
            retry: config.retry_policy(),
        })
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handle_get).post(handle_post))
        .with_state(state)
}

// --- POST /?message=...&<extra fields> ---

async fn handle_post(
    State(state): State<AppState>,
    Query(mut params): Query<HashMap<String, String>>,
) -> Response {
    let Some(message) = params.remove("message") else {
        return (StatusCode::BAD_REQUEST, "missing 'message' query parameter").into_response();
    };

    let mut log = Log::new(Uuid::new_v4().to_string(), message);
    for (name, value) in params {
        log = log.with_field(name, value);
    }

    let client = &state.logging;
    let log_ref = &log;
    let mut attempts = 0u32;
    let result = retry(
        move || {
            attempts += 1;
            let retried = attempts > 1;
            async move {
                match client.add_log(log_ref).await {
                    // An earlier attempt with this identifier landed after all.
                    Err(ClientError::AlreadyExists(_)) if retried => {
                        Ok(AddLogResponse { success: true })
                    }
                    other => other,
                }
            }
        },
        state.retry,
        ClientError::is_retryable,
    )
    .await;

    match result {
        Ok(_) => {
            tracing::info!(identifier = %log.identifier, "log submitted");
            (StatusCode::OK, log.identifier).into_response()
        }
        Err(e) => {
            tracing::error!(identifier = %log.identifier, error = %e, "failed to submit log");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

// --- GET / ---

async fn handle_get(State(state): State<AppState>) -> Response {
    let messages = match fetch_messages(&state).await {
        Ok(text) => text,
        Err(e) => {
            tracing::error!(url = %state.messages_url, error = %e, "messages request failed");
            return (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response();
        }
    };

    let client = &state.logging;
    match retry(move || client.get_logs(), state.retry, ClientError::is_retryable).await {
        Ok(logs) => (StatusCode::OK, format!("{messages}\n{logs}")).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "failed to get logs");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

async fn fetch_messages(state: &AppState) -> Result<String, reqwest::Error> {
    state
        .http
        .get(&state.messages_url)
        .send()
        .await?
        .error_for_status()?
        .text()
        .await
}
