//! Login, registration, logout and the signed-in user's profile

use super::AuthClient;
use crate::error::{AuthError, AuthResult};
use crate::types::{
    AuthResponse, LoginRequest, LoginSuccess, LogoutOutcome, RegisterRequest, Role, UserProfile,
};
use churnboard_core::token;
use reqwest::Method;
use tracing::{debug, info, instrument, warn};

/// Shortest password the registration form accepts
pub const MIN_PASSWORD_LENGTH: usize = 6;

const LOGIN_FAILED: &str = "Login failed. Please check your credentials.";
const REGISTRATION_FAILED: &str = "Registration failed. Please try again.";
const REGISTRATION_SUCCEEDED: &str = "Registration successful! Please sign in with your credentials.";

impl AuthClient {
    /// Sign in as `role`.
    ///
    /// The `isAdmin` claim of the issued token must agree with `role`; if it
    /// does not, the login is refused locally even though the backend
    /// accepted the credentials. That check only keeps users on the right
    /// sign-in screen: the backend still authorizes every request itself.
    /// The session is left untouched on any failure.
    #[instrument(skip(self, email, password))]
    pub async fn login(&self, email: &str, password: &str, role: Role) -> AuthResult<LoginSuccess> {
        let request = self
            .public_request(Method::POST, "/auth/login")
            .json(&LoginRequest {
                email: email.to_string(),
                password: password.to_string(),
            });

        let response: AuthResponse = self
            .execute(request)
            .await
            .map_err(|e| AuthError::from_client(e, AuthError::InvalidCredentials, LOGIN_FAILED))?;

        if !response.success {
            debug!("Backend declined the login");
            return Err(AuthError::InvalidCredentials(
                response.message.unwrap_or_else(|| LOGIN_FAILED.to_string()),
            ));
        }

        let token = response
            .token
            .ok_or_else(|| AuthError::MalformedResponse("login succeeded without a token".into()))?;
        let claims = token::decode(&token)
            .map_err(|e| AuthError::MalformedResponse(format!("issued token is unreadable: {e}")))?;

        if !role.agrees_with(claims.is_admin()) {
            info!("Login refused: account role does not match the requested role");
            return Err(AuthError::RoleMismatch { requested: role });
        }

        self.session().authenticate(token);
        info!("Signed in");

        Ok(LoginSuccess {
            role,
            claims,
            message: response.message,
            user: response.user,
        })
    }

    /// Create an account. Does not sign the new user in.
    ///
    /// Returns the backend's confirmation message, or a default one.
    #[instrument(skip(self, name, email, password))]
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
        is_admin: bool,
    ) -> AuthResult<String> {
        validate_registration(name, email, password)?;

        let request = self
            .public_request(Method::POST, "/auth/register")
            .json(&RegisterRequest {
                name: name.trim().to_string(),
                email: email.trim().to_string(),
                password: password.to_string(),
                is_admin,
            });

        let response: AuthResponse = self.execute(request).await.map_err(|e| {
            AuthError::from_client(e, AuthError::RegistrationRejected, REGISTRATION_FAILED)
        })?;

        if !response.success {
            return Err(AuthError::RegistrationRejected(
                response
                    .message
                    .unwrap_or_else(|| REGISTRATION_FAILED.to_string()),
            ));
        }

        info!("Registered new account");
        Ok(response
            .message
            .unwrap_or_else(|| REGISTRATION_SUCCEEDED.to_string()))
    }

    /// Fetch the profile of the signed-in user.
    ///
    /// Fails with [`AuthError::NotAuthenticated`] without a session. If the
    /// backend no longer accepts the token the session is ended and
    /// [`AuthError::SessionRejected`] returned.
    #[instrument(skip(self))]
    pub async fn current_user(&self) -> AuthResult<UserProfile> {
        let request = self.authorized_request(Method::GET, "/auth/getUserData")?;
        let profile: UserProfile = self.send_authorized(request).await?;
        debug!(admin = profile.is_admin, "Fetched user profile");
        Ok(profile)
    }

    /// Sign out. Always ends the local session, whatever the backend says.
    #[instrument(skip(self))]
    pub async fn logout(&self) -> LogoutOutcome {
        let outcome = if self.session().is_authenticated() {
            let request = self.request(Method::POST, "/auth/logout");
            match self.execute::<AuthResponse>(request).await {
                Ok(response) if response.success => LogoutOutcome::Confirmed,
                Ok(response) => {
                    debug!(message = ?response.message, "Backend did not confirm logout");
                    LogoutOutcome::LocalOnly
                }
                Err(e) => {
                    warn!(error = %e, "Logout request failed, clearing session locally");
                    LogoutOutcome::LocalOnly
                }
            }
        } else {
            LogoutOutcome::LocalOnly
        };

        self.session().logout();
        outcome
    }
}

/// Checks the registration form performs before anything is sent
pub fn validate_registration(name: &str, email: &str, password: &str) -> AuthResult<()> {
    if name.trim().is_empty() {
        return Err(AuthError::Validation("Name is required".to_string()));
    }
    let email = email.trim();
    if email.is_empty() || !email.contains('@') {
        return Err(AuthError::Validation(
            "Please enter a valid email address".to_string(),
        ));
    }
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::Validation(format!(
            "Password must be at least {MIN_PASSWORD_LENGTH} characters long"
        )));
    }
    Ok(())
}
