use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Result alias used across the client
pub type ApiResult<T> = Result<T, ApiError>;

/// Closed error taxonomy for everything the client can report.
///
/// Transport and server failures are converted into one of these variants at
/// the request-executor boundary; nothing past that boundary panics or
/// surfaces raw `reqwest` errors.
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ApiError {
    /// Connectivity failure: DNS, refused connection, dropped socket.
    #[error("network error: {message}")]
    Network { message: String },

    /// The request exceeded the configured timeout and was abandoned.
    #[error("request timed out: {message}")]
    Timeout { message: String },

    /// The server rejected the input (4xx other than 401/409).
    #[error("invalid input ({status}): {detail}")]
    Validation { status: u16, detail: String },

    /// Authentication failure (401). `session_expired` marks the hard case
    /// where the refresh protocol has already been exhausted.
    #[error("authentication failed: {detail}")]
    Auth { detail: String, session_expired: bool },

    /// Duplicate-resource conflict (409). Carries the existing record when
    /// the backend includes one.
    #[error("duplicate resource: {detail}")]
    Conflict {
        detail: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        existing: Option<Value>,
    },

    /// Server-side failure (5xx).
    #[error("server error ({status}): {detail}")]
    Server { status: u16, detail: String },

    /// The response arrived but was not in the shape the client expects.
    #[error("malformed response: {detail}")]
    MalformedResponse { detail: String },
}

impl ApiError {
    /// Stable machine-readable code for logs and UI dispatch
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Network { .. } => "NETWORK",
            ApiError::Timeout { .. } => "TIMEOUT",
            ApiError::Validation { .. } => "VALIDATION",
            ApiError::Auth {
                session_expired: true,
                ..
            } => "SESSION_EXPIRED",
            ApiError::Auth { .. } => "AUTH_FAILED",
            ApiError::Conflict { .. } => "CONFLICT",
            ApiError::Server { .. } => "SERVER",
            ApiError::MalformedResponse { .. } => "MALFORMED_RESPONSE",
        }
    }

    /// HTTP status associated with the error, when there is one
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Validation { status, .. } | ApiError::Server { status, .. } => Some(*status),
            ApiError::Auth { .. } => Some(401),
            ApiError::Conflict { .. } => Some(409),
            _ => None,
        }
    }

    /// True when the caller must send the user back through login
    pub fn requires_reauthentication(&self) -> bool {
        matches!(
            self,
            ApiError::Auth {
                session_expired: true,
                ..
            }
        )
    }

    pub fn network(message: impl Into<String>) -> Self {
        ApiError::Network {
            message: message.into(),
        }
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        ApiError::Timeout {
            message: message.into(),
        }
    }

    pub fn malformed(detail: impl Into<String>) -> Self {
        ApiError::MalformedResponse {
            detail: detail.into(),
        }
    }

    pub fn session_expired(detail: impl Into<String>) -> Self {
        ApiError::Auth {
            detail: detail.into(),
            session_expired: true,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::timeout(err.to_string())
        } else if err.is_decode() {
            ApiError::malformed(err.to_string())
        } else {
            ApiError::network(err.to_string())
        }
    }
}
