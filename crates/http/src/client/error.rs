//! Client error types

use crate::types::AuthResponse;
use thiserror::Error;

/// Client error types
#[derive(Debug, Error)]
pub enum ClientError {
    /// Network or request error
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Server returned an error status
    #[error("Server error {status}: {message}")]
    ServerError { status: u16, message: String },

    /// Authentication failed
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Resource not found
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Bad request
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Forbidden
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Configuration(String),
}

impl ClientError {
    /// Create error from HTTP status code
    pub fn from_status(status: reqwest::StatusCode, message: String) -> Self {
        match status.as_u16() {
            400 | 409 | 422 => Self::BadRequest(message),
            401 => Self::AuthenticationFailed(message),
            403 => Self::Forbidden(message),
            404 => Self::NotFound(message),
            _ => Self::ServerError {
                status: status.as_u16(),
                message,
            },
        }
    }

    /// Message the backend attached to an error body, if it sent one
    pub fn backend_message(&self) -> Option<&str> {
        match self {
            Self::AuthenticationFailed(message)
            | Self::NotFound(message)
            | Self::BadRequest(message)
            | Self::Forbidden(message)
            | Self::ServerError { message, .. } => Some(message.as_str()).filter(|m| !m.is_empty()),
            Self::Request(_) | Self::Configuration(_) => None,
        }
    }

    /// The request never got an answer
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Request(e) if !e.is_decode() && !e.is_status())
    }
}

/// Pull a human-readable message out of an error body.
///
/// The dashboard backend answers errors with the same `{success, message}`
/// envelope as successes; anything else is passed through as plain text.
pub(crate) fn error_message(body: &str) -> String {
    match serde_json::from_str::<AuthResponse>(body) {
        Ok(response) => response.message.unwrap_or_default(),
        Err(_) => body.trim().to_string(),
    }
}
