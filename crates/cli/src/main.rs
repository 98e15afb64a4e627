//! churnboard - session gate for the churn-analytics dashboard

mod commands;
mod config;
mod logging;

use anyhow::{Context, Result};
use churnboard_core::{FileTokenStore, RouteGuard, RouteTable, SessionContext, StateDir};
use churnboard_http::AuthClient;
use clap::{Parser, ValueEnum};
use commands::{App, Commands};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{Level, debug, error};

#[derive(Parser)]
#[command(name = "churnboard")]
#[command(about = "Sign in to the churn-analytics dashboard and check route access")]
#[command(version)]
struct Cli {
    /// Set logging level
    #[arg(short = 'l', long, global = true, default_value = "warn")]
    log_level: LogLevel,

    /// Settings file (TOML or YAML)
    #[arg(short = 'c', long, global = true)]
    config: Option<PathBuf>,

    /// Directory for session state, overriding settings and platform default
    #[arg(short = 'd', long, global = true)]
    state_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    logging::init_logging(cli.log_level.into())?;

    let state_dir = StateDir::new();
    let settings = config::Settings::load(cli.config.as_deref(), &state_dir.config_path())?;
    debug!(base_url = %settings.api.base_url, "Loaded settings");

    let state_dir = cli
        .state_dir
        .or_else(|| settings.storage.state_dir.clone())
        .map_or(state_dir, StateDir::with_override);
    let store = FileTokenStore::new(state_dir.session_dir(), &settings.storage.token_key)
        .context("Invalid token storage settings")?;
    let session = SessionContext::restore(Arc::new(store));

    let mut builder = AuthClient::builder()
        .base_url(settings.api.base_url.clone())
        .session(session.clone());
    if let Some(timeout) = settings.api.timeout() {
        builder = builder.timeout(timeout);
    }
    if let Some(agent) = settings.api.user_agent.clone() {
        builder = builder.user_agent(agent);
    }
    let client = builder.build().context("Failed to build API client")?;

    let app = App {
        client,
        guard: RouteGuard::new(RouteTable::dashboard(), session),
    };

    match cli.command.execute(&app).await {
        Ok(true) => Ok(()),
        Ok(false) => std::process::exit(1),
        Err(e) => {
            error!("Command failed: {e:#}");
            Err(e)
        }
    }
}

#[derive(Clone, Debug, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for Level {
    fn from(log_level: LogLevel) -> Self {
        match log_level {
            LogLevel::Error => Self::ERROR,
            LogLevel::Warn => Self::WARN,
            LogLevel::Info => Self::INFO,
            LogLevel::Debug => Self::DEBUG,
            LogLevel::Trace => Self::TRACE,
        }
    }
}
