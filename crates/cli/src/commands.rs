//! CLI commands

use anyhow::Result;
use churnboard_core::{Navigation, RouteGuard};
use churnboard_http::{AuthClient, AuthError, Role};
use clap::{Subcommand, ValueEnum};
use tracing::{debug, warn};

#[derive(Subcommand)]
pub enum Commands {
    /// Sign in and keep the session for later commands
    Login {
        #[arg(long)]
        email: String,

        /// Account password
        #[arg(long, env = "CHURNBOARD_PASSWORD", hide_env_values = true)]
        password: String,

        /// Role to sign in as
        #[arg(long, value_enum, default_value = "admin")]
        role: RoleArg,
    },

    /// Create an account; sign in separately afterwards
    Register {
        #[arg(long)]
        name: String,

        #[arg(long)]
        email: String,

        #[arg(long, env = "CHURNBOARD_PASSWORD", hide_env_values = true)]
        password: String,

        /// Register as an administrator
        #[arg(long)]
        admin: bool,
    },

    /// End the session
    Logout,

    /// Show the current session and the signed-in user
    Status,

    /// Check whether a dashboard path may be opened
    Navigate {
        /// Path such as `/settings` or `/crm/CUST-0042`
        path: String,
    },

    /// List the dashboard routes
    Routes,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum RoleArg {
    Admin,
    User,
}

impl From<RoleArg> for Role {
    fn from(role: RoleArg) -> Self {
        match role {
            RoleArg::Admin => Self::Admin,
            RoleArg::User => Self::User,
        }
    }
}

/// What a command needs to run
pub struct App {
    pub client: AuthClient,
    pub guard: RouteGuard,
}

impl Commands {
    /// Run the command. `Ok(false)` means it ran but the outcome was a
    /// refusal the user should see reflected in the exit status.
    pub async fn execute(self, app: &App) -> Result<bool> {
        match self {
            Self::Login {
                email,
                password,
                role,
            } => report(app.client.login(&email, &password, role.into()).await.map(
                |success| {
                    let who = success
                        .claims
                        .email()
                        .or_else(|| success.claims.name())
                        .unwrap_or(email.as_str())
                        .to_string();
                    format!("Signed in as {who} ({})", success.role)
                },
            )),
            Self::Register {
                name,
                email,
                password,
                admin,
            } => report(app.client.register(&name, &email, &password, admin).await),
            Self::Logout => {
                let outcome = app.client.logout().await;
                println!("{}", outcome.message());
                Ok(true)
            }
            Self::Status => Ok(print_status(app).await),
            Self::Navigate { path } => Ok(navigate(&app.guard, &path)),
            Self::Routes => {
                for route in app.guard.routes().iter() {
                    let access = if route.public {
                        "public"
                    } else if route.requires_admin {
                        "admin"
                    } else {
                        "signed-in"
                    };
                    println!("{:<24} {access}", route.path);
                }
                Ok(true)
            }
        }
    }
}

fn report(result: Result<String, AuthError>) -> Result<bool> {
    match result {
        Ok(message) => {
            println!("{message}");
            Ok(true)
        }
        Err(AuthError::Configuration(message)) => {
            anyhow::bail!("invalid client configuration: {message}")
        }
        Err(e) => {
            debug!(error = %e, "Command refused");
            eprintln!("{}", e.user_message());
            Ok(false)
        }
    }
}

async fn print_status(app: &App) -> bool {
    let session = app.client.session();
    if !session.is_authenticated() {
        println!("Signed out");
        return true;
    }

    match app.client.current_user().await {
        Ok(profile) => {
            let role = if profile.is_admin { "admin" } else { "user" };
            println!("Signed in ({role})");
            if !profile.email.is_empty() {
                println!("  email:   {}", profile.email);
            }
            if !profile.name.is_empty() {
                println!("  name:    {}", profile.name);
            }
        }
        Err(AuthError::SessionRejected) => {
            eprintln!("{}", AuthError::SessionRejected.user_message());
            return false;
        }
        Err(e) => {
            warn!(error = %e, "Could not fetch the user profile, showing token claims");
            print_claims(app);
        }
    }

    if let Some(exp) = session.claims().and_then(|claims| claims.expires_at()) {
        let expires = chrono::DateTime::from_timestamp(exp, 0)
            .map_or_else(|| exp.to_string(), |at| at.to_rfc3339());
        println!("  expires: {expires}");
    }
    true
}

fn print_claims(app: &App) {
    match app.client.session().claims() {
        Some(claims) => {
            let role = if claims.is_admin() { "admin" } else { "user" };
            println!("Signed in ({role}, offline)");
            if let Some(email) = claims.email() {
                println!("  email:   {email}");
            }
            if let Some(name) = claims.name() {
                println!("  name:    {name}");
            }
        }
        None => println!("Signed in (claims unreadable)"),
    }
}

fn navigate(guard: &RouteGuard, path: &str) -> bool {
    match guard.navigate(path) {
        Navigation::Granted(route) => {
            println!("granted {}", route.path);
            true
        }
        Navigation::Redirect(to) => {
            println!("redirect {to}");
            false
        }
        Navigation::NotFound => {
            println!("not found {path}");
            false
        }
    }
}
