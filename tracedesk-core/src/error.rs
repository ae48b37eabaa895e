//! Errors raised by the gateway and everything built on top of it

use thiserror::Error;

/// Message carried by [`ApiError::AuthExpired`]
pub const AUTH_EXPIRED_MESSAGE: &str = "Authentication expired. Please login again.";

/// Errors that can occur while talking to the requirements API
#[derive(Error, Debug)]
pub enum ApiError {
    /// The request never produced an HTTP response (connection refused, timeout, ...)
    #[error("Request failed: {0}")]
    Transport(String),

    /// The server answered with a non-2xx status
    #[error("{message}")]
    Status { status: u16, message: String },

    /// The server answered 401; the session has been cleared
    #[error("Authentication expired. Please login again.")]
    AuthExpired,

    /// A required field was missing; nothing was sent
    #[error("Validation failed: {0}")]
    Validation(String),

    /// The response body did not have the expected shape
    #[error("Invalid response payload: {0}")]
    InvalidPayload(String),

    /// The local state file could not be read or written
    #[error("Local state error: {0}")]
    Storage(String),
}

impl ApiError {
    /// HTTP status for server-side rejections
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            ApiError::AuthExpired => Some(401),
            _ => None,
        }
    }

    pub fn is_auth_expired(&self) -> bool {
        matches!(self, ApiError::AuthExpired)
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(e: serde_json::Error) -> Self {
        ApiError::InvalidPayload(e.to_string())
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(e: anyhow::Error) -> Self {
        ApiError::Storage(format!("{:#}", e))
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;
