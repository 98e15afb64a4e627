//! Unverified token claim decoding
//!
//! Tokens issued by the dashboard backend are JWT-shaped: three dot-separated
//! segments whose middle one is base64url-encoded JSON. The decoder here reads
//! that payload so the UI can tell admins from regular users. It never checks
//! the signature; the backend verifies tokens on every request.

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use serde_json::{Map, Value};
use thiserror::Error;

/// Reasons a token could not be decoded
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("expected 3 token segments, found {0}")]
    SegmentCount(usize),

    #[error("payload is not valid base64url: {0}")]
    Base64(String),

    #[error("payload is not valid JSON: {0}")]
    Json(String),

    #[error("payload is not a JSON object")]
    NotAnObject,
}

/// Claims carried in a token payload
///
/// Holds the payload object verbatim; the accessors below read the members
/// the dashboard cares about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Claims(Map<String, Value>);

impl Claims {
    /// Whether the payload marks the holder as an administrator.
    ///
    /// Anything other than a literal `true` counts as `false`.
    pub fn is_admin(&self) -> bool {
        matches!(self.0.get("isAdmin"), Some(Value::Bool(true)))
    }

    /// Expiry as seconds since the Unix epoch, if present.
    ///
    /// Fractional values are truncated toward zero.
    #[allow(clippy::cast_possible_truncation)]
    pub fn expires_at(&self) -> Option<i64> {
        let exp = self.0.get("exp")?;
        exp.as_i64().or_else(|| {
            exp.as_f64()
                .filter(|secs| secs.is_finite())
                .map(|secs| secs.trunc() as i64)
        })
    }

    /// Whether the token has expired at `now` (seconds since the epoch).
    /// Tokens without an `exp` claim never expire client-side.
    pub fn is_expired_at(&self, now: i64) -> bool {
        self.expires_at().is_some_and(|exp| now >= exp)
    }

    /// Subject identifier (`sub`, falling back to `id`)
    pub fn subject(&self) -> Option<&str> {
        self.str_claim("sub").or_else(|| self.str_claim("id"))
    }

    pub fn email(&self) -> Option<&str> {
        self.str_claim("email")
    }

    pub fn name(&self) -> Option<&str> {
        self.str_claim("name")
    }

    /// Raw access to any payload member
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// The payload object exactly as decoded
    pub const fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }

    fn str_claim(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }
}

impl From<Map<String, Value>> for Claims {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// Decode the payload segment of `token` into [`Claims`].
///
/// The header and signature segments are not inspected. Trailing `=` padding
/// on the payload is accepted.
pub fn decode(token: &str) -> Result<Claims, DecodeError> {
    let segments: Vec<&str> = token.split('.').collect();
    if segments.len() != 3 {
        return Err(DecodeError::SegmentCount(segments.len()));
    }

    let payload = segments[1].trim_end_matches('=');
    let bytes = URL_SAFE_NO_PAD
        .decode(payload)
        .map_err(|e| DecodeError::Base64(e.to_string()))?;

    match serde_json::from_slice::<Value>(&bytes) {
        Ok(Value::Object(map)) => Ok(Claims(map)),
        Ok(_) => Err(DecodeError::NotAnObject),
        Err(e) => Err(DecodeError::Json(e.to_string())),
    }
}

/// Total variant of [`decode`]: malformed tokens yield `None`.
pub fn claims_of(token: &str) -> Option<Claims> {
    match decode(token) {
        Ok(claims) => Some(claims),
        Err(e) => {
            tracing::debug!(error = %e, "Token claims could not be decoded");
            None
        }
    }
}
