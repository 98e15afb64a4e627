//! CLI settings
//!
//! Layered the usual way: built-in defaults, then an optional settings file,
//! then `CHURNBOARD_*` environment variables (`CHURNBOARD_API__BASE_URL`).

use anyhow::{Context, Result};
use churnboard_core::DEFAULT_TOKEN_KEY;
use churnboard_http::DEFAULT_BASE_URL;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Top-level settings
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub api: ApiSettings,
    pub storage: StorageSettings,
}

/// Backend connection settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiSettings {
    /// Base URL the `/auth/*` paths are appended to
    pub base_url: String,
    /// Request timeout; unset leaves it to the transport
    pub timeout_secs: Option<u64>,
    pub user_agent: Option<String>,
}

/// Where the session token is kept
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    /// Overrides the platform state directory
    pub state_dir: Option<PathBuf>,
    pub token_key: String,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: None,
            user_agent: None,
        }
    }
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            state_dir: None,
            token_key: DEFAULT_TOKEN_KEY.to_string(),
        }
    }
}

impl ApiSettings {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

impl Settings {
    /// Load settings. An explicit `path` must exist; `fallback` is read only
    /// if present.
    pub fn load(path: Option<&Path>, fallback: &Path) -> Result<Self> {
        let file = match path {
            Some(path) => config::File::from(path).required(true),
            None => config::File::from(fallback).required(false),
        };

        let settings = config::Config::builder()
            .set_default("api.base_url", DEFAULT_BASE_URL)?
            .set_default("storage.token_key", DEFAULT_TOKEN_KEY)?
            .add_source(file)
            .add_source(
                config::Environment::with_prefix("CHURNBOARD")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()
            .context("Failed to read settings")?;

        settings
            .try_deserialize()
            .context("Failed to parse settings")
    }
}
