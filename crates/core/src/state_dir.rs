//! Platform-specific state directory management

use directories::ProjectDirs;
use std::path::PathBuf;
use tracing::warn;

/// Resolves where churnboard keeps state that must survive restarts
pub struct StateDir {
    project_dirs: Option<ProjectDirs>,
    /// Override directory for testing or custom installations
    override_dir: Option<PathBuf>,
}

impl StateDir {
    /// Create a new StateDir from the platform conventions
    pub fn new() -> Self {
        let project_dirs = ProjectDirs::from("com", "Churnboard", "churnboard");
        if project_dirs.is_none() {
            warn!("Failed to determine platform-specific directories, will use fallback");
        }
        Self {
            project_dirs,
            override_dir: None,
        }
    }

    /// Create a new StateDir rooted at `path`
    pub fn with_override(path: impl Into<PathBuf>) -> Self {
        Self {
            project_dirs: None,
            override_dir: Some(path.into()),
        }
    }

    /// Directory holding the session entry
    pub fn session_dir(&self) -> PathBuf {
        if let Some(override_dir) = &self.override_dir {
            return override_dir.join("session");
        }

        if let Some(project_dirs) = &self.project_dirs {
            project_dirs.data_local_dir().join("session")
        } else {
            PathBuf::from("./session")
        }
    }

    /// Get the configuration directory
    pub fn config_dir(&self) -> PathBuf {
        if let Some(override_dir) = &self.override_dir {
            return override_dir.join("config");
        }

        if let Some(project_dirs) = &self.project_dirs {
            project_dirs.config_dir().to_path_buf()
        } else {
            PathBuf::from("./config")
        }
    }

    /// Default location of the optional settings file
    pub fn config_path(&self) -> PathBuf {
        self.config_dir().join("churnboard.toml")
    }
}

impl Default for StateDir {
    fn default() -> Self {
        Self::new()
    }
}
