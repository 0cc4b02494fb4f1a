use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use logging_api::rpc::{AddLogResponse, GetLogsRequest, Log, LogsString, RpcCode, RpcStatus};
use logging_engine::{ErrorClass, LoggingError};

use super::AppState;

/// A failed call, rendered as an `RpcStatus` body.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: RpcStatus,
}

impl From<LoggingError> for ApiError {
    fn from(err: LoggingError) -> Self {
        let status = match err.class() {
            ErrorClass::InvalidArgument => StatusCode::BAD_REQUEST,
            ErrorClass::Conflict => StatusCode::CONFLICT,
            ErrorClass::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            tracing::error!(error = %err, "request failed");
        }
        Self {
            status,
            body: RpcStatus::new(err.rpc_code(), err.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

// ═══════════════════════════════════════════════════════════════
//  POST /logging/add
// ═══════════════════════════════════════════════════════════════

pub(crate) async fn handle_add_log(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<AddLogResponse>, ApiError> {
    let log: Log = parse_body(&body)?;
    Ok(Json(state.service.add_log(log).await?))
}

// ═══════════════════════════════════════════════════════════════
//  POST /logging/get
// ═══════════════════════════════════════════════════════════════

pub(crate) async fn handle_get_logs(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<LogsString>, ApiError> {
    // Empty body is the same as `{}`.
    let request = if body.is_empty() {
        GetLogsRequest::default()
    } else {
        parse_body(&body)?
    };
    Ok(Json(state.service.get_logs(request).await?))
}

pub(crate) async fn handle_healthy() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

fn parse_body<T: serde::de::DeserializeOwned>(body: &[u8]) -> Result<T, ApiError> {
    serde_json::from_slice(body).map_err(|e| ApiError {
        status: StatusCode::BAD_REQUEST,
        body: RpcStatus::new(RpcCode::InvalidArgument, format!("malformed request: {e}")),
    })
}
