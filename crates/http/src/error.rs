//! Auth error taxonomy
//!
//! Every variant maps to a message that can be shown to the user as-is; see
//! [`AuthError::user_message`].

use crate::client::error::ClientError;
use crate::types::Role;
use thiserror::Error;

/// Failures of the auth API client
#[derive(Debug, Error)]
pub enum AuthError {
    /// The backend could not be reached
    #[error("network error: {0}")]
    Network(String),

    /// The backend rejected the credentials
    #[error("invalid credentials: {0}")]
    InvalidCredentials(String),

    /// The backend refused the registration
    #[error("registration rejected: {0}")]
    RegistrationRejected(String),

    /// Valid credentials, but the account does not hold the requested role
    #[error("account is not registered as {}", .requested.article_noun())]
    RoleMismatch { requested: Role },

    /// Input rejected before anything was sent
    #[error("validation failed: {0}")]
    Validation(String),

    /// The backend failed while handling the request
    #[error("server error {status}: {message}")]
    Server { status: u16, message: String },

    /// The backend answered with something unusable
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// The session is valid but may not perform this request
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// The requested resource does not exist
    #[error("not found: {0}")]
    NotFound(String),

    /// The backend refused an authorized request as invalid
    #[error("request rejected: {0}")]
    RequestRejected(String),

    /// The backend rejected the session token; the session has been ended
    #[error("session rejected by the server")]
    SessionRejected,

    /// An authorized call was attempted without a session
    #[error("not signed in")]
    NotAuthenticated,

    #[error("invalid client configuration: {0}")]
    Configuration(String),
}

pub type AuthResult<T> = Result<T, AuthError>;

impl AuthError {
    /// Text suitable for showing to the user
    pub fn user_message(&self) -> String {
        match self {
            Self::Network(_) => "Network error. Please try again.".to_string(),
            Self::InvalidCredentials(message)
            | Self::RegistrationRejected(message)
            | Self::Validation(message)
            | Self::RequestRejected(message) => message.clone(),
            Self::RoleMismatch { requested } => format!(
                "This account is not registered as {}.",
                requested.article_noun()
            ),
            Self::Server { .. } | Self::MalformedResponse(_) => {
                "An error occurred while contacting the server. Please try again.".to_string()
            }
            Self::Forbidden(_) => "You do not have permission to do that.".to_string(),
            Self::NotFound(_) => "The requested resource was not found.".to_string(),
            Self::SessionRejected => {
                "Your session has expired. Please sign in again.".to_string()
            }
            Self::NotAuthenticated => "Please sign in to continue.".to_string(),
            Self::Configuration(message) => format!("The client is misconfigured: {message}"),
        }
    }

    /// Whether trying again unchanged might succeed
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Server { .. })
    }

    /// Map a client error from an endpoint whose 4xx answers mean `rejected`
    pub(crate) fn from_client(error: ClientError, rejected: fn(String) -> Self, fallback: &str) -> Self {
        if error.is_transport() {
            return Self::Network(error.to_string());
        }
        let message = error
            .backend_message()
            .map_or_else(|| fallback.to_string(), str::to_string);
        match error {
            ClientError::Request(e) => Self::MalformedResponse(e.to_string()),
            ClientError::Configuration(message) => Self::Configuration(message),
            ClientError::ServerError { status, .. } => Self::Server { status, message },
            ClientError::AuthenticationFailed(_)
            | ClientError::NotFound(_)
            | ClientError::BadRequest(_)
            | ClientError::Forbidden(_) => rejected(message),
        }
    }
}
