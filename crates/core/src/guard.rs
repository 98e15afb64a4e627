//! Route guard
//!
//! Pure decisions over the session and the route table. Nothing here writes
//! to the session, and nothing is cached: the token may change between two
//! navigations, so every call decodes afresh.

use crate::routes::{HOME_PATH, LOGIN_PATH, Route, RouteTable};
use crate::session::{SessionContext, SessionState};
use crate::token;
use tracing::debug;

/// Outcome of a guard check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    Grant,
    /// Denied; send the user to the login entry. Wrong-role and
    /// unauthenticated denials look the same.
    RedirectToLogin,
}

impl GuardDecision {
    pub const fn is_granted(self) -> bool {
        matches!(self, Self::Grant)
    }
}

/// Decide whether `state` may enter a route with the given admin requirement
pub fn check(state: &SessionState, requires_admin: bool) -> GuardDecision {
    let Some(token) = state.token() else {
        return GuardDecision::RedirectToLogin;
    };

    let is_admin = token::claims_of(token).is_some_and(|claims| claims.is_admin());
    if requires_admin && !is_admin {
        return GuardDecision::RedirectToLogin;
    }

    GuardDecision::Grant
}

/// Where a navigation attempt ends up
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation<'a> {
    Granted(&'a Route),
    Redirect(&'static str),
    NotFound,
}

/// Guards navigation over a route table
#[derive(Debug, Clone)]
pub struct RouteGuard {
    routes: RouteTable,
    session: SessionContext,
}

impl RouteGuard {
    pub const fn new(routes: RouteTable, session: SessionContext) -> Self {
        Self { routes, session }
    }

    pub const fn routes(&self) -> &RouteTable {
        &self.routes
    }

    /// Guard a single route against the current session
    pub fn check_route(&self, route: &Route) -> GuardDecision {
        if route.public {
            return GuardDecision::Grant;
        }
        check(&self.session.state(), route.requires_admin)
    }

    /// Resolve `path` and decide where the user lands
    pub fn navigate(&self, path: &str) -> Navigation<'_> {
        let Some(route) = self.routes.resolve(path) else {
            debug!(path, "No route matches");
            return Navigation::NotFound;
        };

        if route.is_login() && self.session.is_authenticated() {
            debug!("Already signed in, leaving the login page");
            return Navigation::Redirect(HOME_PATH);
        }

        match self.check_route(route) {
            GuardDecision::Grant => {
                debug!(route = %route.path, "Navigation granted");
                Navigation::Granted(route)
            }
            GuardDecision::RedirectToLogin => {
                debug!(route = %route.path, "Navigation denied");
                Navigation::Redirect(LOGIN_PATH)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryTokenStore;
    use crate::token::test_support::token_for;
    use serde_json::json;
    use std::sync::Arc;

    fn authenticated(payload: &serde_json::Value) -> SessionState {
        SessionState::Authenticated {
            token: token_for(payload),
        }
    }

    fn guard() -> (SessionContext, RouteGuard) {
        let session = SessionContext::new(Arc::new(MemoryTokenStore::new()));
        let guard = RouteGuard::new(RouteTable::dashboard(), session.clone());
        (session, guard)
    }

    #[test]
    fn test_unauthenticated_is_always_redirected() {
        for requires_admin in [false, true] {
            assert_eq!(
                check(&SessionState::Unauthenticated, requires_admin),
                GuardDecision::RedirectToLogin
            );
        }
    }

    #[test]
    fn test_admin_route_requires_admin_claim() {
        assert_eq!(
            check(&authenticated(&json!({"isAdmin": true})), true),
            GuardDecision::Grant
        );
        assert_eq!(
            check(&authenticated(&json!({"isAdmin": false})), true),
            GuardDecision::RedirectToLogin
        );
        assert_eq!(
            check(&authenticated(&json!({})), true),
            GuardDecision::RedirectToLogin
        );
    }

    #[test]
    fn test_user_route_ignores_admin_claim() {
        for payload in [json!({"isAdmin": true}), json!({"isAdmin": false}), json!({})] {
            assert_eq!(check(&authenticated(&payload), false), GuardDecision::Grant);
        }
    }

    #[test]
    fn test_malformed_token_fails_closed_for_admin_routes() {
        let state = SessionState::Authenticated {
            token: "garbage".to_string(),
        };
        assert_eq!(check(&state, true), GuardDecision::RedirectToLogin);
        assert_eq!(check(&state, false), GuardDecision::Grant);
    }

    #[test]
    fn test_navigate_signed_out() {
        let (_, guard) = guard();

        assert_eq!(guard.navigate("/"), Navigation::Redirect(LOGIN_PATH));
        assert_eq!(guard.navigate("/settings"), Navigation::Redirect(LOGIN_PATH));
        assert!(matches!(guard.navigate("/login"), Navigation::Granted(r) if r.is_login()));
        assert!(matches!(guard.navigate("/register"), Navigation::Granted(_)));
        assert_eq!(guard.navigate("/nowhere"), Navigation::NotFound);
    }

    #[test]
    fn test_navigate_as_user() {
        let (session, guard) = guard();
        session.authenticate(token_for(&json!({"isAdmin": false})));

        assert!(matches!(guard.navigate("/crm/CUST-7"), Navigation::Granted(_)));
        assert_eq!(guard.navigate("/settings"), Navigation::Redirect(LOGIN_PATH));
        assert_eq!(guard.navigate("/login"), Navigation::Redirect(HOME_PATH));
    }

    #[test]
    fn test_navigate_as_admin() {
        let (session, guard) = guard();
        session.authenticate(token_for(&json!({"isAdmin": true})));

        assert!(matches!(guard.navigate("/settings"), Navigation::Granted(r) if r.requires_admin));
    }

    #[test]
    fn test_decision_follows_token_changes() {
        let (session, guard) = guard();

        session.authenticate(token_for(&json!({"isAdmin": true})));
        assert!(matches!(guard.navigate("/settings"), Navigation::Granted(_)));

        session.authenticate(token_for(&json!({"isAdmin": false})));
        assert_eq!(guard.navigate("/settings"), Navigation::Redirect(LOGIN_PATH));

        session.logout();
        assert_eq!(guard.navigate("/"), Navigation::Redirect(LOGIN_PATH));
    }

    #[test]
    fn test_guard_does_not_mutate_session() {
        let (session, guard) = guard();
        session.authenticate("garbage");

        let before = session.state();
        let _ = guard.navigate("/settings");
        let _ = guard.navigate("/login");
        assert_eq!(session.state(), before);
    }
}
