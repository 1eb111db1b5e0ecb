//! Error types for flow
//!
//! Exit codes:
//! - 0: Success
//! - 2: User error (bad args, validation, unknown ids, bad credentials)
//! - 3: Blocked by policy (identity may not perform the write)
//! - 4: Operation failed (I/O, serialization, lock contention, workbook)

use std::path::PathBuf;
use thiserror::Error;

/// Exit codes for the flow CLI
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const USER_ERROR: i32 = 2;
    pub const POLICY_BLOCKED: i32 = 3;
    pub const OPERATION_FAILED: i32 = 4;
}

/// Main error type for flow operations
#[derive(Error, Debug)]
pub enum Error {
    // User errors (exit code 2)
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Task not found: {0}")]
    TaskNotFound(i64),

    #[error("Update not found: {0}")]
    UpdateNotFound(i64),

    #[error("Category not found: {0}")]
    CategoryNotFound(String),

    #[error("Authentication failed for {0}")]
    AuthenticationFailed(String),

    // Policy blocks (exit code 3)
    #[error("{identity} may not {action}")]
    PermissionDenied { identity: String, action: String },

    #[error("Category {0} is a default category and cannot be deleted")]
    ProtectedCategory(String),

    // Operation failures (exit code 4)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("Lock acquisition failed: {0}")]
    LockFailed(PathBuf),

    #[error("Workbook error: {0}")]
    Sheet(String),

    #[error("Operation failed: {0}")]
    OperationFailed(String),
}

impl Error {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            // User errors
            Error::InvalidConfig(_)
            | Error::InvalidArgument(_)
            | Error::Validation(_)
            | Error::TaskNotFound(_)
            | Error::UpdateNotFound(_)
            | Error::CategoryNotFound(_)
            | Error::AuthenticationFailed(_) => exit_codes::USER_ERROR,

            // Policy blocks
            Error::PermissionDenied { .. } | Error::ProtectedCategory(_) => {
                exit_codes::POLICY_BLOCKED
            }

            // Operation failures
            Error::Io(_)
            | Error::Json(_)
            | Error::TomlParse(_)
            | Error::TomlSerialize(_)
            | Error::LockFailed(_)
            | Error::Sheet(_)
            | Error::OperationFailed(_) => exit_codes::OPERATION_FAILED,
        }
    }

    /// Structured fields for machine-readable error output
    pub fn details(&self) -> Option<serde_json::Value> {
        match self {
            Error::PermissionDenied { identity, action } => Some(serde_json::json!({
                "identity": identity,
                "action": action,
            })),
            Error::TaskNotFound(id) | Error::UpdateNotFound(id) => {
                Some(serde_json::json!({ "id": id }))
            }
            Error::CategoryNotFound(key) | Error::ProtectedCategory(key) => {
                Some(serde_json::json!({ "category": key }))
            }
            Error::InvalidConfig(message)
            | Error::InvalidArgument(message)
            | Error::Validation(message) => Some(serde_json::json!({ "message": message })),
            Error::LockFailed(path) => Some(serde_json::json!({
                "path": path.display().to_string(),
            })),
            _ => None,
        }
    }

    pub(crate) fn denied(identity: &str, action: impl Into<String>) -> Self {
        Error::PermissionDenied {
            identity: identity.to_string(),
            action: action.into(),
        }
    }
}

/// Result type alias for flow operations
pub type Result<T> = std::result::Result<T, Error>;

/// Wrapper for displaying errors in JSON format
#[derive(serde::Serialize)]
pub struct JsonError {
    pub error: String,
    pub code: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl From<&Error> for JsonError {
    fn from(err: &Error) -> Self {
        JsonError {
            error: err.to_string(),
            code: err.exit_code(),
            details: err.details(),
        }
    }
}
