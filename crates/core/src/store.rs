//! Durable token persistence
//!
//! The store mirrors the session token so a restart can pick the session back
//! up. It holds one entry under a fixed key and performs no validation; the
//! session layer decides what a stored token is worth.

use crate::error::{CoreError, CoreResult};
use crate::state_dir::StateDir;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use tracing::debug;

/// Key the token is stored under
pub const DEFAULT_TOKEN_KEY: &str = "token";

/// Persistence for the current session token
///
/// Concurrent writers race last-write-wins.
pub trait TokenStore: Send + Sync {
    /// Store `token`, replacing whatever was there
    fn save(&self, token: &str) -> CoreResult<()>;

    /// Last saved token, if any
    fn load(&self) -> CoreResult<Option<String>>;

    /// Remove the stored token; succeeds when nothing is stored
    fn clear(&self) -> CoreResult<()>;
}

/// Token store that lives as long as the process
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    token: Mutex<Option<String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TokenStore for MemoryTokenStore {
    fn save(&self, token: &str) -> CoreResult<()> {
        *self.token.lock().unwrap_or_else(PoisonError::into_inner) = Some(token.to_owned());
        Ok(())
    }

    fn load(&self) -> CoreResult<Option<String>> {
        Ok(self
            .token
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    fn clear(&self) -> CoreResult<()> {
        self.token
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        Ok(())
    }
}

/// Token store backed by a single file holding the raw token
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    /// Store the token as `<dir>/<key>`
    pub fn new(dir: impl AsRef<Path>, key: &str) -> CoreResult<Self> {
        if key.is_empty() || key.contains(['/', '\\']) || key == "." || key == ".." {
            return Err(CoreError::invalid_config(format!(
                "token key must be a plain file name, got {key:?}"
            )));
        }
        Ok(Self {
            path: dir.as_ref().join(key),
        })
    }

    /// Store under the platform session directory with the default key
    pub fn in_state_dir(state_dir: &StateDir) -> CoreResult<Self> {
        Self::new(state_dir.session_dir(), DEFAULT_TOKEN_KEY)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TokenStore for FileTokenStore {
    fn save(&self, token: &str) -> CoreResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        // Whole-file replace so a reader never sees a half-written token.
        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, token)?;
        std::fs::rename(&tmp, &self.path)?;
        debug!(path = %self.path.display(), "Saved session token");
        Ok(())
    }

    fn load(&self) -> CoreResult<Option<String>> {
        match std::fs::read_to_string(&self.path) {
            Ok(token) => Ok(Some(token)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn clear(&self) -> CoreResult<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {
                debug!(path = %self.path.display(), "Cleared session token");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn assert_round_trip(store: &dyn TokenStore) {
        assert_eq!(store.load().unwrap(), None);

        store.save("first.token.value").unwrap();
        assert_eq!(store.load().unwrap().as_deref(), Some("first.token.value"));

        store.save("second.token.value").unwrap();
        assert_eq!(store.load().unwrap().as_deref(), Some("second.token.value"));

        store.clear().unwrap();
        assert_eq!(store.load().unwrap(), None);

        // Clearing twice is fine
        store.clear().unwrap();
    }

    #[test]
    fn test_memory_store_round_trip() {
        assert_round_trip(&MemoryTokenStore::new());
    }

    #[test]
    fn test_file_store_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileTokenStore::new(temp_dir.path().join("nested"), DEFAULT_TOKEN_KEY).unwrap();
        assert_round_trip(&store);
    }

    #[test]
    fn test_file_store_survives_reopen() {
        let temp_dir = TempDir::new().unwrap();
        let state_dir = StateDir::with_override(temp_dir.path());

        FileTokenStore::in_state_dir(&state_dir)
            .unwrap()
            .save("persisted.token.value")
            .unwrap();

        let reopened = FileTokenStore::in_state_dir(&state_dir).unwrap();
        assert_eq!(
            reopened.load().unwrap().as_deref(),
            Some("persisted.token.value")
        );
        assert_eq!(
            std::fs::read_to_string(reopened.path()).unwrap(),
            "persisted.token.value"
        );
    }

    #[test]
    fn test_file_store_rejects_path_like_keys() {
        let temp_dir = TempDir::new().unwrap();
        for key in ["", "..", "a/b", "a\\b"] {
            assert!(matches!(
                FileTokenStore::new(temp_dir.path(), key),
                Err(CoreError::InvalidConfig { .. })
            ));
        }
    }
}
