//! Dashboard route table

use serde::{Deserialize, Serialize};

/// Path of the login entry point every denial redirects to
pub const LOGIN_PATH: &str = "/login";

/// Landing page for signed-in users
pub const HOME_PATH: &str = "/";

/// A single route table entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    /// Path pattern; segments starting with `:` match any single segment
    pub path: String,
    /// Only administrators may enter
    #[serde(default)]
    pub requires_admin: bool,
    /// Reachable without a session
    #[serde(default)]
    pub public: bool,
}

impl Route {
    /// A route that needs a signed-in user
    pub fn protected(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            requires_admin: false,
            public: false,
        }
    }

    /// A route that needs a signed-in administrator
    pub fn admin(path: impl Into<String>) -> Self {
        Self {
            requires_admin: true,
            ..Self::protected(path)
        }
    }

    /// A route open to everyone
    pub fn public(path: impl Into<String>) -> Self {
        Self {
            public: true,
            ..Self::protected(path)
        }
    }

    pub fn is_login(&self) -> bool {
        self.path == LOGIN_PATH
    }

    /// Whether `path` matches this route's pattern. Literal segments compare
    /// ASCII case-insensitively; parameter values are taken as written.
    pub fn matches(&self, path: &str) -> bool {
        let mut pattern = segments(&self.path);
        let mut candidate = segments(path);
        loop {
            match (pattern.next(), candidate.next()) {
                (None, None) => return true,
                (Some(p), Some(c)) if p.starts_with(':') || p.eq_ignore_ascii_case(c) => {}
                _ => return false,
            }
        }
    }
}

fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

/// Ordered set of routes; the first match wins
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteTable {
    routes: Vec<Route>,
}

impl RouteTable {
    pub const fn new(routes: Vec<Route>) -> Self {
        Self { routes }
    }

    /// The analytics dashboard's routes
    pub fn dashboard() -> Self {
        Self::new(vec![
            Route::public(LOGIN_PATH),
            Route::public("/register"),
            Route::protected(HOME_PATH),
            Route::protected("/crm"),
            Route::protected("/crm/:customerId"),
            Route::protected("/churn-prediction"),
            Route::protected("/shap-analysis"),
            Route::protected("/behavior-tracker"),
            Route::protected("/kanban"),
            Route::admin("/settings"),
        ])
    }

    /// First route matching `path`
    pub fn resolve(&self, path: &str) -> Option<&Route> {
        let path = path.split(['?', '#']).next().unwrap_or(path);
        self.routes.iter().find(|route| route.matches(path))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Route> {
        self.routes.iter()
    }
}

impl Default for RouteTable {
    fn default() -> Self {
        Self::dashboard()
    }
}
