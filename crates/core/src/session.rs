//! Session state and the injectable session context
//!
//! [`SessionContext`] is created once at start-up and handed to the route
//! guard and the auth client. It is the single source of truth for whether
//! the user is signed in and which token goes on outgoing requests. Every
//! transition is mirrored to the [`TokenStore`] so the session survives a
//! restart; store failures are logged and otherwise ignored.

use crate::store::TokenStore;
use crate::token::{self, Claims};
use chrono::Utc;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, info, warn};

/// Authentication state
#[derive(Clone, Default, PartialEq, Eq)]
pub enum SessionState {
    #[default]
    Unauthenticated,
    Authenticated {
        token: String,
    },
}

impl SessionState {
    pub const fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated { .. })
    }

    pub fn token(&self) -> Option<&str> {
        match self {
            Self::Authenticated { token } => Some(token),
            Self::Unauthenticated => None,
        }
    }
}

// Tokens are credentials, keep them out of logs.
impl fmt::Debug for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unauthenticated => f.write_str("Unauthenticated"),
            Self::Authenticated { .. } => f.write_str("Authenticated { token: <redacted> }"),
        }
    }
}

struct Inner {
    state: RwLock<SessionState>,
    store: Arc<dyn TokenStore>,
}

/// Shared handle to the session
///
/// Cloning is cheap; all clones observe the same state.
#[derive(Clone)]
pub struct SessionContext {
    inner: Arc<Inner>,
}

impl SessionContext {
    /// Start an empty session backed by `store`. The store is not read.
    pub fn new(store: Arc<dyn TokenStore>) -> Self {
        Self::with_state(store, SessionState::Unauthenticated)
    }

    /// Start a session from whatever token `store` holds.
    ///
    /// Tokens that cannot be decoded or have expired are known-invalid: they
    /// are cleared from the store and the session starts unauthenticated.
    pub fn restore(store: Arc<dyn TokenStore>) -> Self {
        Self::restore_at(store, Utc::now().timestamp())
    }

    /// [`Self::restore`] with an explicit clock, seconds since the epoch
    pub fn restore_at(store: Arc<dyn TokenStore>, now: i64) -> Self {
        let stored = match store.load() {
            Ok(token) => token,
            Err(e) => {
                warn!(error = %e, "Could not read persisted session, starting signed out");
                None
            }
        };

        let Some(token) = stored else {
            debug!("No persisted session found");
            return Self::new(store);
        };

        let valid = token::claims_of(&token).is_some_and(|claims| !claims.is_expired_at(now));
        if valid {
            info!("Restored persisted session");
            Self::with_state(store, SessionState::Authenticated { token })
        } else {
            info!("Discarding invalid or expired persisted session");
            let session = Self::new(store);
            session.clear_store();
            session
        }
    }

    fn with_state(store: Arc<dyn TokenStore>, state: SessionState) -> Self {
        Self {
            inner: Arc::new(Inner {
                state: RwLock::new(state),
                store,
            }),
        }
    }

    /// Snapshot of the current state
    pub fn state(&self) -> SessionState {
        self.inner
            .state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.inner
            .state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_authenticated()
    }

    /// Token to attach to outgoing requests
    pub fn bearer_token(&self) -> Option<String> {
        self.state().token().map(str::to_owned)
    }

    /// Claims of the current token, decoded fresh on every call
    pub fn claims(&self) -> Option<Claims> {
        self.bearer_token().as_deref().and_then(token::claims_of)
    }

    /// Enter `Authenticated(token)`, replacing any previous token
    pub fn authenticate(&self, token: impl Into<String>) {
        let token = token.into();
        let mut state = self
            .inner
            .state
            .write()
            .unwrap_or_else(PoisonError::into_inner);

        if state.is_authenticated() {
            debug!("Replacing token of authenticated session");
        }
        if let Err(e) = self.inner.store.save(&token) {
            warn!(error = %e, "Failed to persist session token; session will not survive restart");
        }
        *state = SessionState::Authenticated { token };
        info!("Session authenticated");
    }

    /// Enter `Unauthenticated` and clear the store. Never fails.
    pub fn logout(&self) {
        let mut state = self
            .inner
            .state
            .write()
            .unwrap_or_else(PoisonError::into_inner);

        let was_authenticated = state.is_authenticated();
        *state = SessionState::Unauthenticated;
        self.clear_store();

        if was_authenticated {
            info!("Session ended");
        } else {
            debug!("Logout on an unauthenticated session");
        }
    }

    /// Log out if the current token has expired. Returns whether the session
    /// is still authenticated afterwards.
    pub fn validate(&self) -> bool {
        self.validate_at(Utc::now().timestamp())
    }

    /// [`Self::validate`] with an explicit clock, seconds since the epoch
    pub fn validate_at(&self, now: i64) -> bool {
        let expired = self.claims().is_some_and(|claims| claims.is_expired_at(now));
        if expired {
            info!("Session token expired");
            self.logout();
        }
        self.is_authenticated()
    }

    fn clear_store(&self) {
        if let Err(e) = self.inner.store.clear() {
            warn!(error = %e, "Failed to clear persisted session token");
        }
    }
}

impl fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionContext")
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;
    use crate::store::{MemoryTokenStore, mock::MockTokenStore};
    use crate::token::test_support::token_for;
    use serde_json::json;

    fn memory_session() -> (Arc<MemoryTokenStore>, SessionContext) {
        let store = Arc::new(MemoryTokenStore::new());
        let session = SessionContext::new(store.clone());
        (store, session)
    }

    #[test]
    fn test_starts_unauthenticated() {
        let (_, session) = memory_session();
        assert_eq!(session.state(), SessionState::Unauthenticated);
        assert_eq!(session.bearer_token(), None);
        assert_eq!(session.claims(), None);
    }

    #[test]
    fn test_authenticate_persists_token() {
        let (store, session) = memory_session();
        let token = token_for(&json!({"isAdmin": true}));

        session.authenticate(token.clone());

        assert!(session.is_authenticated());
        assert_eq!(session.bearer_token(), Some(token.clone()));
        assert_eq!(store.load().unwrap(), Some(token));
        assert!(session.claims().unwrap().is_admin());
    }

    #[test]
    fn test_authenticate_twice_overwrites() {
        let (store, session) = memory_session();
        let admin = token_for(&json!({"isAdmin": true}));
        let user = token_for(&json!({"isAdmin": false}));

        session.authenticate(admin);
        session.authenticate(user.clone());

        assert_eq!(session.state(), SessionState::Authenticated { token: user.clone() });
        assert_eq!(store.load().unwrap(), Some(user));
        assert!(!session.claims().unwrap().is_admin());
    }

    #[test]
    fn test_logout_clears_store() {
        let (store, session) = memory_session();
        session.authenticate(token_for(&json!({"isAdmin": false})));

        session.logout();

        assert_eq!(session.state(), SessionState::Unauthenticated);
        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn test_logout_is_idempotent() {
        let (store, session) = memory_session();
        store.save("stale.token.left-behind").unwrap();

        session.logout();
        session.logout();

        assert_eq!(session.state(), SessionState::Unauthenticated);
        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn test_clones_share_state() {
        let (_, session) = memory_session();
        let other = session.clone();

        session.authenticate(token_for(&json!({"isAdmin": false})));
        assert!(other.is_authenticated());

        other.logout();
        assert!(!session.is_authenticated());
    }

    #[test]
    fn test_save_failure_is_absorbed() {
        let mut store = MockTokenStore::new();
        store
            .expect_save()
            .times(1)
            .returning(|_| Err(CoreError::storage("disk full")));

        let session = SessionContext::new(Arc::new(store));
        session.authenticate(token_for(&json!({"isAdmin": false})));

        assert!(session.is_authenticated());
    }

    #[test]
    fn test_clear_failure_is_absorbed() {
        let mut store = MockTokenStore::new();
        store.expect_save().returning(|_| Ok(()));
        store
            .expect_clear()
            .times(1)
            .returning(|| Err(CoreError::storage("read-only filesystem")));

        let session = SessionContext::new(Arc::new(store));
        session.authenticate(token_for(&json!({"isAdmin": false})));
        session.logout();

        assert!(!session.is_authenticated());
    }

    #[test]
    fn test_restore_valid_token() {
        let store = Arc::new(MemoryTokenStore::new());
        let token = token_for(&json!({"isAdmin": true, "exp": 2_000}));
        store.save(&token).unwrap();

        let session = SessionContext::restore_at(store.clone(), 1_000);

        assert_eq!(session.bearer_token(), Some(token.clone()));
        assert_eq!(store.load().unwrap(), Some(token));
    }

    #[test]
    fn test_restore_token_without_expiry() {
        let store = Arc::new(MemoryTokenStore::new());
        store.save(&token_for(&json!({"isAdmin": false}))).unwrap();

        let session = SessionContext::restore_at(store, 1_000);
        assert!(session.is_authenticated());
    }

    #[test]
    fn test_restore_discards_expired_token() {
        let store = Arc::new(MemoryTokenStore::new());
        store
            .save(&token_for(&json!({"isAdmin": true, "exp": 500})))
            .unwrap();

        let session = SessionContext::restore_at(store.clone(), 1_000);

        assert!(!session.is_authenticated());
        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn test_restore_discards_token_with_fractional_expiry() {
        let store = Arc::new(MemoryTokenStore::new());
        store
            .save(&token_for(&json!({"isAdmin": false, "exp": 500.5})))
            .unwrap();

        let session = SessionContext::restore_at(store.clone(), 1_000);

        assert!(!session.is_authenticated());
        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn test_restore_discards_malformed_token() {
        let store = Arc::new(MemoryTokenStore::new());
        store.save("not-a-token").unwrap();

        let session = SessionContext::restore_at(store.clone(), 1_000);

        assert!(!session.is_authenticated());
        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn test_restore_with_unreadable_store() {
        let mut store = MockTokenStore::new();
        store
            .expect_load()
            .times(1)
            .returning(|| Err(CoreError::storage("permission denied")));

        let session = SessionContext::restore(Arc::new(store));
        assert!(!session.is_authenticated());
    }

    #[test]
    fn test_validate_logs_out_expired_session() {
        let (store, session) = memory_session();
        session.authenticate(token_for(&json!({"isAdmin": false, "exp": 1_000})));

        assert!(session.validate_at(999));
        assert!(session.is_authenticated());

        assert!(!session.validate_at(1_000));
        assert!(!session.is_authenticated());
        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn test_debug_redacts_token() {
        let (_, session) = memory_session();
        session.authenticate("secret.payload.signature");
        let rendered = format!("{session:?}");
        assert!(!rendered.contains("secret"));
        assert!(rendered.contains("Authenticated"));
    }
}
