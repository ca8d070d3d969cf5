//! Persisted navigation position.
//!
//! Opening a job's detail view and coming back should land on the same
//! list page. The controller captures a [`NavigationSnapshot`] that a
//! [`SessionStore`] writes as JSON into the data directory. Persistence is
//! best effort: failures are logged and never reach the caller.

use jobdeck_core::{AppConfig, JobId};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const SESSION_FILE: &str = "navigation.json";

/// Where the list was when the snapshot was taken.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavigationSnapshot {
    /// 1-based page counter
    pub page: u32,
    /// Link to the following page
    pub next: Option<String>,
    /// Link to the preceding page
    pub previous: Option<String>,
    /// Active search query
    pub query: String,
    /// Normalized path of the displayed page
    pub current_path: String,
}

/// Stores a single snapshot on disk.
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    /// Store backed by an explicit file.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store in the application data directory.
    ///
    /// Fails with [`jobdeck_core::JobdeckError::Config`] when the platform
    /// has no data directory.
    pub fn in_data_dir() -> jobdeck_core::Result<Self> {
        Ok(Self::new(AppConfig::data_dir()?.join(SESSION_FILE)))
    }

    /// Backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write `snapshot`, replacing any earlier one.
    pub fn save(&self, snapshot: &NavigationSnapshot) {
        if let Err(e) = self.try_save(snapshot) {
            warn!(path = %self.path.display(), error = %e, "failed to save navigation state");
        }
    }

    fn try_save(&self, snapshot: &NavigationSnapshot) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(snapshot).map_err(std::io::Error::other)?;
        fs::write(&self.path, json)
    }

    /// Read the stored snapshot, if there is a readable one.
    #[must_use]
    pub fn load(&self) -> Option<NavigationSnapshot> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "failed to read navigation state");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "ignoring corrupt navigation state");
                None
            }
        }
    }

    /// Forget the stored snapshot.
    pub fn clear(&self) {
        match fs::remove_file(&self.path) {
            Ok(()) => debug!(path = %self.path.display(), "cleared navigation state"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = %self.path.display(), error = %e, "failed to clear navigation state"),
        }
    }
}

/// Route of a job's detail view.
#[must_use]
pub fn job_detail_path(id: JobId) -> String {
    format!("/jobs/{id}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn snapshot() -> NavigationSnapshot {
        NavigationSnapshot {
            page: 3,
            next: Some("http://testserver/api/jobs/?after=45&page_size=15".to_string()),
            previous: Some("http://testserver/api/jobs/?before=31&page_size=15".to_string()),
            query: "he".to_string(),
            current_path: "/jobs/?after=30&page_size=15".to_string(),
        }
    }

    #[test]
    fn test_save_then_load() {
        let temp = TempDir::new().expect("create temp dir");
        let store = SessionStore::new(temp.path().join("nested").join(SESSION_FILE));

        assert!(store.load().is_none());
        store.save(&snapshot());
        assert_eq!(store.load(), Some(snapshot()));

        store.clear();
        assert!(store.load().is_none());
        store.clear();
    }

    #[test]
    fn test_corrupt_file_is_ignored() {
        let temp = TempDir::new().expect("create temp dir");
        let path = temp.path().join(SESSION_FILE);
        fs::write(&path, "{not json").expect("write");

        assert!(SessionStore::new(&path).load().is_none());
    }

    #[test]
    fn test_missing_fields_default() {
        let temp = TempDir::new().expect("create temp dir");
        let path = temp.path().join(SESSION_FILE);
        fs::write(&path, r#"{"page": 2}"#).expect("write");

        let loaded = SessionStore::new(&path).load().expect("partial snapshot");
        assert_eq!(loaded.page, 2);
        assert!(loaded.query.is_empty());
    }

    #[test]
    fn test_save_failure_is_swallowed() {
        let temp = TempDir::new().expect("create temp dir");
        let blocker = temp.path().join("file");
        fs::write(&blocker, "x").expect("write");

        // parent is a regular file, so the directory cannot be created
        let store = SessionStore::new(blocker.join(SESSION_FILE));
        store.save(&snapshot());
        assert!(store.load().is_none());
    }

    #[test]
    fn test_job_detail_path() {
        assert_eq!(job_detail_path(JobId(42)), "/jobs/42");
    }
}
