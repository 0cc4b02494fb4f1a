use std::time::Duration;

use logging_api::StoreError;
use logging_api::rpc::RpcCode;

/// Caller-facing class of a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    InvalidArgument,
    Conflict,
    Internal,
}

impl From<ErrorClass> for RpcCode {
    fn from(class: ErrorClass) -> Self {
        match class {
            ErrorClass::InvalidArgument => RpcCode::InvalidArgument,
            ErrorClass::Conflict => RpcCode::AlreadyExists,
            ErrorClass::Internal => RpcCode::Internal,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("identifier must not be empty")]
    InvalidIdentifier,

    #[error("log '{0}' has no message")]
    InvalidRecord(String),

    #[error("Log already exists: '{0}'")]
    AlreadyExists(String),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("stored log '{identifier}' has no string message")]
    MalformedRecord { identifier: String },

    /// The write may or may not have landed; retrying the same identifier
    /// reports `AlreadyExists` if it did.
    #[error("admission of '{0}' timed out, outcome unknown")]
    Indeterminate(String),

    #[error("request timed out after {0:?}")]
    TimedOut(Duration),

    #[error("config error: {0}")]
    Config(String),
}

impl LoggingError {
    pub fn class(&self) -> ErrorClass {
        match self {
            LoggingError::InvalidIdentifier | LoggingError::InvalidRecord(_) => {
                ErrorClass::InvalidArgument
            }
            LoggingError::AlreadyExists(_) => ErrorClass::Conflict,
            LoggingError::Store(_)
            | LoggingError::MalformedRecord { .. }
            | LoggingError::Indeterminate(_)
            | LoggingError::TimedOut(_)
            | LoggingError::Config(_) => ErrorClass::Internal,
        }
    }

    pub fn rpc_code(&self) -> RpcCode {
        self.class().into()
    }
}
