//! Churnboard HTTP: the auth API client for the dashboard backend

pub mod client;
pub mod error;
pub mod types;

pub use client::{AuthClient, AuthClientBuilder, DEFAULT_BASE_URL, auth::MIN_PASSWORD_LENGTH};
pub use error::{AuthError, AuthResult};
pub use types::{LoginSuccess, LogoutOutcome, Role, UserProfile};
