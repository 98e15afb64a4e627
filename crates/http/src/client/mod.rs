//! Dashboard auth API client

pub mod auth;
pub mod error;

use crate::error::{AuthError, AuthResult};
use churnboard_core::{MemoryTokenStore, SessionContext};
use error::ClientError;
use reqwest::{Client, ClientBuilder, Method, header};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Default backend the dashboard talks to
pub const DEFAULT_BASE_URL: &str = "https://ai-personalised-dashboard.vercel.app/api";

/// Client for the dashboard backend
///
/// Owns a handle to the [`SessionContext`] it reconciles results into; the
/// same context is typically shared with the route guard.
#[derive(Clone)]
pub struct AuthClient {
    client: Client,
    base_url: String,
    session: SessionContext,
}

impl AuthClient {
    /// Create a new client with default configuration
    pub fn new(base_url: impl Into<String>, session: SessionContext) -> Result<Self, ClientError> {
        Self::builder().base_url(base_url).session(session).build()
    }

    /// Create a new client builder
    pub fn builder() -> AuthClientBuilder {
        AuthClientBuilder::default()
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub const fn session(&self) -> &SessionContext {
        &self.session
    }

    /// Request without credentials
    pub fn public_request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        self.client.request(method, url)
    }

    /// Request carrying the session's bearer token, if there is one
    pub fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let request = self.public_request(method, path);
        match self.session.bearer_token() {
            Some(token) => request.header(header::AUTHORIZATION, format!("Bearer {token}")),
            None => request,
        }
    }

    /// Execute a request and handle common errors
    pub async fn execute<T: serde::de::DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, ClientError> {
        let response = request.send().await?;
        let status = response.status();

        if status.is_success() {
            Ok(response.json().await?)
        } else {
            let body = response.text().await.unwrap_or_default();
            let message = error::error_message(&body);
            Err(ClientError::from_status(status, message))
        }
    }

    /// Build a request for a protected endpoint.
    ///
    /// Fails with [`AuthError::NotAuthenticated`] when there is no session.
    pub fn authorized_request(&self, method: Method, path: &str) -> AuthResult<reqwest::RequestBuilder> {
        if !self.session.is_authenticated() {
            return Err(AuthError::NotAuthenticated);
        }
        Ok(self.request(method, path))
    }

    /// Execute a request against a protected endpoint.
    ///
    /// A `401` means the backend no longer accepts the token: the session is
    /// ended and [`AuthError::SessionRejected`] returned.
    pub async fn send_authorized<T: serde::de::DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> AuthResult<T> {
        match self.execute(request).await {
            Ok(value) => Ok(value),
            Err(ClientError::AuthenticationFailed(message)) => {
                warn!(%message, "Backend rejected the session token, signing out");
                self.session.logout();
                Err(AuthError::SessionRejected)
            }
            Err(ClientError::Forbidden(message)) => {
                debug!(%message, "Authorized request forbidden");
                Err(AuthError::Forbidden(message))
            }
            Err(ClientError::NotFound(message)) => {
                debug!(%message, "Authorized request hit a missing resource");
                Err(AuthError::NotFound(message))
            }
            Err(e) => {
                debug!(error = %e, "Authorized request failed");
                Err(AuthError::from_client(
                    e,
                    AuthError::RequestRejected,
                    "The request was rejected.",
                ))
            }
        }
    }
}

impl std::fmt::Debug for AuthClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthClient")
            .field("base_url", &self.base_url)
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}

/// Builder for AuthClient
#[derive(Default)]
pub struct AuthClientBuilder {
    base_url: Option<String>,
    session: Option<SessionContext>,
    timeout: Option<Duration>,
    user_agent: Option<String>,
}

impl AuthClientBuilder {
    /// Set the base URL
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Session to reconcile results into; defaults to a fresh in-memory one
    pub fn session(mut self, session: SessionContext) -> Self {
        self.session = Some(session);
        self
    }

    /// Set the request timeout. Without one the transport default applies.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the user agent
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// Build the client
    pub fn build(self) -> Result<AuthClient, ClientError> {
        let base_url = self
            .base_url
            .ok_or_else(|| ClientError::Configuration("base_url is required".into()))?;

        let parsed = url::Url::parse(&base_url)
            .map_err(|e| ClientError::Configuration(format!("invalid base_url {base_url:?}: {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ClientError::Configuration(format!(
                "base_url must be http or https, got {}",
                parsed.scheme()
            )));
        }

        // Ensure base_url ends without a trailing slash
        let base_url = base_url.trim_end_matches('/').to_string();

        let mut client_builder = ClientBuilder::new();

        if let Some(timeout) = self.timeout {
            client_builder = client_builder.timeout(timeout);
        }

        client_builder = client_builder.user_agent(
            self.user_agent
                .unwrap_or_else(|| concat!("churnboard/", env!("CARGO_PKG_VERSION")).to_string()),
        );

        let client = client_builder.build()?;

        let session = self
            .session
            .unwrap_or_else(|| SessionContext::new(Arc::new(MemoryTokenStore::new())));

        Ok(AuthClient {
            client,
            base_url,
            session,
        })
    }
}
