//! Storage namespace layout for a session

use std::path::{Path, PathBuf};

use crate::error::Result;

/// Resolved paths for one session's storage namespace
#[derive(Debug, Clone)]
pub struct SessionPaths {
    /// Namespace root: `<data_dir>/<session_id>`
    pub root: PathBuf,
    /// Directory of append-only snapshot records
    pub live_dir: PathBuf,
    /// Ordered list of bookmarked indices
    pub bookmarks_file: PathBuf,
    /// Session status record
    pub status_file: PathBuf,
}

impl SessionPaths {
    pub fn new(data_dir: &Path, session_id: &str) -> Self {
        let root = data_dir.join(session_id);
        Self {
            live_dir: root.join("live"),
            bookmarks_file: root.join("bookmarks.json"),
            status_file: root.join("status.json"),
            root,
        }
    }

    /// Create the namespace directories if they do not exist yet.
    pub async fn ensure(&self) -> Result<()> {
        tokio::fs::create_dir_all(&self.live_dir).await?;
        Ok(())
    }
}

/// Enumerate session namespaces under the data directory, sorted by name.
pub async fn list_sessions(data_dir: &Path) -> Result<Vec<String>> {
    let mut sessions = Vec::new();
    let mut entries = match tokio::fs::read_dir(data_dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(sessions),
        Err(e) => return Err(e.into()),
    };

    while let Some(entry) = entries.next_entry().await? {
        if entry.file_type().await?.is_dir() {
            if let Some(name) = entry.file_name().to_str() {
                sessions.push(name.to_string());
            }
        }
    }

    sessions.sort();
    Ok(sessions)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_ensure_creates_namespace() {
        let dir = tempfile::tempdir().unwrap();
        let paths = SessionPaths::new(dir.path(), "slide-001");
        paths.ensure().await.unwrap();

        assert!(paths.live_dir.is_dir());
        assert_eq!(paths.root, dir.path().join("slide-001"));
    }

    #[tokio::test]
    async fn test_list_sessions_sorted() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b-slide", "a-slide"] {
            SessionPaths::new(dir.path(), name).ensure().await.unwrap();
        }

        let sessions = list_sessions(dir.path()).await.unwrap();
        assert_eq!(sessions, vec!["a-slide", "b-slide"]);
    }

    #[tokio::test]
    async fn test_list_sessions_missing_data_dir() {
        let dir = tempfile::tempdir().unwrap();
        let sessions = list_sessions(&dir.path().join("nope")).await.unwrap();
        assert!(sessions.is_empty());
    }
}
