//! Per-session status record
//!
//! Tracks whether the user has marked a session done. Bookmarking a state
//! also marks the session done; the toggle is available on its own as well.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::store::write_json_atomic;

/// User-visible session status, persisted as `status.json`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionStatus {
    pub done: bool,
    #[serde(rename = "lastUpdated")]
    pub last_updated: DateTime<Utc>,
}

impl Default for SessionStatus {
    fn default() -> Self {
        Self {
            done: false,
            last_updated: Utc::now(),
        }
    }
}

impl SessionStatus {
    /// Load the status record; a missing file means a fresh session.
    pub async fn load(path: &Path) -> Result<Self> {
        match tokio::fs::read(path).await {
            Ok(bytes) => {
                serde_json::from_slice(&bytes).map_err(|source| Error::Serialization {
                    path: path.to_path_buf(),
                    source,
                })
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn save(&self, path: &Path) -> Result<()> {
        write_json_atomic(path, self).await
    }

    /// Set the done flag and refresh the timestamp.
    pub fn set_done(&mut self, done: bool) {
        self.done = done;
        self.last_updated = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_file_is_fresh_status() {
        let dir = tempfile::tempdir().unwrap();
        let status = SessionStatus::load(&dir.path().join("status.json"))
            .await
            .unwrap();
        assert!(!status.done);
    }

    #[tokio::test]
    async fn test_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("status.json");

        let mut status = SessionStatus::default();
        status.set_done(true);
        status.save(&path).await.unwrap();

        let loaded = SessionStatus::load(&path).await.unwrap();
        assert!(loaded.done);
    }
}
