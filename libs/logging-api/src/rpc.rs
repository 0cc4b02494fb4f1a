//! Request/response messages of the logging RPC surface.

use serde::{Deserialize, Serialize};

pub use crate::record::LogRecord as Log;

/// Route of the AddLog call.
pub const ADD_LOG_PATH: &str = "/logging/add";
/// Route of the GetLogs call.
pub const GET_LOGS_PATH: &str = "/logging/get";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddLogResponse {
    pub success: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetLogsRequest {}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogsString {
    pub logs_string: String,
}

/// Failure class carried back to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RpcCode {
    /// The identifier was already admitted. Resubmitting will not help.
    AlreadyExists,
    /// The request itself is unusable (empty identifier, no message).
    InvalidArgument,
    /// Store or service failure unrelated to the caller's input.
    Internal,
}

impl std::fmt::Display for RpcCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RpcCode::AlreadyExists => f.write_str("already_exists"),
            RpcCode::InvalidArgument => f.write_str("invalid_argument"),
            RpcCode::Internal => f.write_str("internal"),
        }
    }
}

/// Error body of a failed call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpcStatus {
    pub code: RpcCode,
    pub message: String,
}

impl RpcStatus {
    pub fn new(code: RpcCode, message: impl Into<String>) -> Self {
        Self { code, message: message.into() }
    }
}
