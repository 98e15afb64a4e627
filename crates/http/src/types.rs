//! Wire types for the dashboard auth endpoints

use churnboard_core::Claims;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Login request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Registration request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub is_admin: bool,
}

/// Account summary returned by `/auth/getUserData` and, on some
/// deployments, alongside a login
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserProfile {
    #[serde(alias = "_id")]
    pub id: String,
    pub name: String,
    pub email: String,
    pub is_admin: bool,
}

/// Accept whatever the backend puts under `user`; anything that does not
/// read as a profile is dropped rather than failing the whole envelope.
fn lenient_profile<'de, D>(deserializer: D) -> Result<Option<UserProfile>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.and_then(|value| serde_json::from_value(value).ok()))
}

/// Envelope every auth endpoint answers with
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default, deserialize_with = "lenient_profile")]
    pub user: Option<UserProfile>,
}

/// Role a user asserts when signing in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    User,
}

impl Role {
    /// Whether a token's `isAdmin` claim agrees with this role
    pub const fn agrees_with(self, is_admin: bool) -> bool {
        match self {
            Self::Admin => is_admin,
            Self::User => !is_admin,
        }
    }

    /// How the role reads in user-facing messages
    pub const fn article_noun(self) -> &'static str {
        match self {
            Self::Admin => "an administrator",
            Self::User => "a user",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Admin => f.write_str("admin"),
            Self::User => f.write_str("user"),
        }
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "admin" => Ok(Self::Admin),
            "user" => Ok(Self::User),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

/// Result of a successful sign-in
#[derive(Debug, Clone)]
pub struct LoginSuccess {
    pub role: Role,
    /// Claims decoded from the issued token at sign-in time
    pub claims: Claims,
    pub message: Option<String>,
    pub user: Option<UserProfile>,
}

/// Whether the backend acknowledged a logout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogoutOutcome {
    Confirmed,
    /// The session was cleared locally only
    LocalOnly,
}

impl LogoutOutcome {
    pub const fn message(self) -> &'static str {
        match self {
            Self::Confirmed => "Logout successful",
            Self::LocalOnly => "Logged out locally",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_register_request_uses_camel_case() {
        let body = serde_json::to_value(RegisterRequest {
            name: "Asha".into(),
            email: "asha@example.com".into(),
            password: "secret1".into(),
            is_admin: true,
        })
        .unwrap();
        assert_eq!(body["isAdmin"], json!(true));
        assert!(body.get("is_admin").is_none());
    }

    #[test]
    fn test_auth_response_tolerates_missing_fields() {
        let response: AuthResponse = serde_json::from_value(json!({"message": "nope"})).unwrap();
        assert!(!response.success);
        assert!(response.token.is_none());
        assert_eq!(response.message.as_deref(), Some("nope"));
    }

    #[test]
    fn test_profile_accepts_mongo_id_and_missing_fields() {
        let profile: UserProfile =
            serde_json::from_value(json!({"_id": "64f1", "email": "a@b.c", "isAdmin": true}))
                .unwrap();
        assert_eq!(profile.id, "64f1");
        assert_eq!(profile.name, "");
        assert_eq!(profile.email, "a@b.c");
        assert!(profile.is_admin);
    }

    #[test]
    fn test_unreadable_user_does_not_fail_envelope() {
        let response: AuthResponse = serde_json::from_value(json!({
            "success": true,
            "token": "h.p.s",
            "user": {"id": 42, "name": ["not", "a", "string"]}
        }))
        .unwrap();
        assert!(response.success);
        assert!(response.user.is_none());

        let response: AuthResponse =
            serde_json::from_value(json!({"success": true, "user": "u-1"})).unwrap();
        assert!(response.user.is_none());

        let response: AuthResponse =
            serde_json::from_value(json!({"success": true, "user": null})).unwrap();
        assert!(response.user.is_none());
    }

    #[test]
    fn test_role_agreement() {
        assert!(Role::Admin.agrees_with(true));
        assert!(!Role::Admin.agrees_with(false));
        assert!(Role::User.agrees_with(false));
        assert!(!Role::User.agrees_with(true));
    }

    #[test]
    fn test_role_parsing() {
        assert_eq!("Admin".parse::<Role>(), Ok(Role::Admin));
        assert_eq!("user".parse::<Role>(), Ok(Role::User));
        assert!("root".parse::<Role>().is_err());
    }
}
