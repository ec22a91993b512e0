//! Bookmark index
//!
//! A sparse, ordered subset of the live sequence the user explicitly
//! marked, navigable independently of the full history. Persisted as a
//! compact ordered JSON array, separate from the snapshot records.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

use super::snapshot::SnapshotStore;
use super::write_json_atomic;

/// Ordered set of bookmarked snapshot indices for one session
pub struct BookmarkIndex {
    path: PathBuf,
    marks: BTreeSet<u64>,
}

impl BookmarkIndex {
    /// Load the bookmark list; a missing file means no bookmarks yet.
    pub async fn open(path: &Path) -> Result<Self> {
        let marks = match tokio::fs::read(path).await {
            Ok(bytes) => {
                let indices: Vec<u64> =
                    serde_json::from_slice(&bytes).map_err(|source| Error::Serialization {
                        path: path.to_path_buf(),
                        source,
                    })?;
                indices.into_iter().collect()
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeSet::new(),
            Err(e) => return Err(e.into()),
        };

        Ok(Self {
            path: path.to_path_buf(),
            marks,
        })
    }

    /// Bookmark `index`. Fails `NotFound` if the index is not in the live
    /// sequence. Idempotent; returns whether the mark was new.
    pub async fn mark(&mut self, store: &SnapshotStore, index: u64) -> Result<bool> {
        if !store.contains(index) {
            return Err(Error::NotFound(index));
        }
        if !self.marks.insert(index) {
            return Ok(false);
        }

        if let Err(e) = self.persist().await {
            // Keep the in-memory set consistent with disk.
            self.marks.remove(&index);
            return Err(e);
        }

        tracing::debug!(index, total = self.marks.len(), "bookmark added");
        Ok(true)
    }

    /// Greatest bookmarked index strictly less than `index`.
    pub fn predecessor_of(&self, index: u64) -> Result<u64> {
        self.marks
            .range(..index)
            .next_back()
            .copied()
            .ok_or(Error::NoSuchTransition("previous bookmark"))
    }

    /// Smallest bookmarked index strictly greater than `index`.
    pub fn successor_of(&self, index: u64) -> Result<u64> {
        self.marks
            .range(index + 1..)
            .next()
            .copied()
            .ok_or(Error::NoSuchTransition("next bookmark"))
    }

    pub fn contains(&self, index: u64) -> bool {
        self.marks.contains(&index)
    }

    /// Bookmarked indices, ascending.
    pub fn indices(&self) -> Vec<u64> {
        self.marks.iter().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.marks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.marks.is_empty()
    }

    async fn persist(&self) -> Result<()> {
        let indices: Vec<u64> = self.marks.iter().copied().collect();
        write_json_atomic(&self.path, &indices).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotations::AnnotationState;

    async fn store_with(n: u64, dir: &Path) -> SnapshotStore {
        let mut store = SnapshotStore::open(dir).await.unwrap();
        for _ in 0..n {
            store.append(AnnotationState::empty()).await.unwrap();
        }
        store
    }

    #[tokio::test]
    async fn test_mark_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_with(3, &dir.path().join("live")).await;
        let mut bookmarks = BookmarkIndex::open(&dir.path().join("bookmarks.json"))
            .await
            .unwrap();

        assert!(bookmarks.mark(&store, 1).await.unwrap());
        assert!(!bookmarks.mark(&store, 1).await.unwrap());
        assert_eq!(bookmarks.len(), 1);
    }

    #[tokio::test]
    async fn test_mark_rejects_unknown_index() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_with(2, &dir.path().join("live")).await;
        let mut bookmarks = BookmarkIndex::open(&dir.path().join("bookmarks.json"))
            .await
            .unwrap();

        match bookmarks.mark(&store, 99).await {
            Err(Error::NotFound(99)) => {}
            other => panic!("expected NotFound, got {other:?}"),
        }
        assert!(bookmarks.is_empty());
    }

    #[tokio::test]
    async fn test_predecessor_and_successor_queries() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_with(10, &dir.path().join("live")).await;
        let mut bookmarks = BookmarkIndex::open(&dir.path().join("bookmarks.json"))
            .await
            .unwrap();
        for index in [2, 5, 8] {
            bookmarks.mark(&store, index).await.unwrap();
        }

        assert_eq!(bookmarks.predecessor_of(5).unwrap(), 2);
        assert_eq!(bookmarks.successor_of(5).unwrap(), 8);
        assert_eq!(bookmarks.predecessor_of(9).unwrap(), 8);

        assert!(bookmarks.predecessor_of(2).unwrap_err().is_no_such_transition());
        assert!(bookmarks.successor_of(8).unwrap_err().is_no_such_transition());
    }

    #[tokio::test]
    async fn test_bookmarks_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_with(5, &dir.path().join("live")).await;
        let path = dir.path().join("bookmarks.json");
        {
            let mut bookmarks = BookmarkIndex::open(&path).await.unwrap();
            bookmarks.mark(&store, 3).await.unwrap();
            bookmarks.mark(&store, 0).await.unwrap();
        }

        let bookmarks = BookmarkIndex::open(&path).await.unwrap();
        assert_eq!(bookmarks.indices(), vec![0, 3]);
    }
}
