//! Append-only snapshot store
//!
//! One JSON file per snapshot, named by zero-padded index
//! (`00047.json`). Indices are assigned strictly increasing with no gaps;
//! an index is only consumed once its record is durably in place, so a
//! failed append reuses the same would-be index on the next attempt.
//!
//! Retention is an external concern: this store never deletes records.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::annotations::{AnnotationState, Snapshot};
use crate::error::{Error, Result};

use super::write_json_atomic;

/// Append-only log of immutable annotation states for one session
pub struct SnapshotStore {
    live_dir: PathBuf,
    indices: BTreeSet<u64>,
}

impl SnapshotStore {
    /// Open the store, creating the directory if needed and scanning the
    /// existing records to rebuild the live sequence.
    pub async fn open(live_dir: &Path) -> Result<Self> {
        tokio::fs::create_dir_all(live_dir).await?;

        let mut indices = BTreeSet::new();
        let mut entries = tokio::fs::read_dir(live_dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            // Skip files whose stem is not a plain index.
            if let Some(index) = path
                .file_stem()
                .and_then(|s| s.to_str())
                .and_then(|s| s.parse::<u64>().ok())
            {
                indices.insert(index);
            }
        }

        tracing::debug!(
            records = indices.len(),
            dir = %live_dir.display(),
            "snapshot store opened"
        );

        Ok(Self {
            live_dir: live_dir.to_path_buf(),
            indices,
        })
    }

    fn record_path(&self, index: u64) -> PathBuf {
        self.live_dir.join(format!("{index:05}.json"))
    }

    /// Append a new snapshot and return its index.
    ///
    /// The record becomes visible atomically; on failure the index is not
    /// consumed and the next successful append reuses it.
    pub async fn append(&mut self, state: AnnotationState) -> Result<u64> {
        let index = self.indices.last().map(|i| i + 1).unwrap_or(0);
        let snapshot = Snapshot::new(index, state);

        write_json_atomic(&self.record_path(index), &snapshot).await?;
        self.indices.insert(index);

        tracing::debug!(index, "snapshot appended");
        Ok(index)
    }

    /// Read the snapshot at `index`.
    pub async fn read(&self, index: u64) -> Result<Snapshot> {
        let path = self.record_path(index);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::NotFound(index))
            }
            Err(e) => return Err(e.into()),
        };

        serde_json::from_slice(&bytes).map_err(|source| Error::Serialization { path, source })
    }

    /// Existing indices, ascending.
    pub fn list_indices(&self) -> Vec<u64> {
        self.indices.iter().copied().collect()
    }

    pub fn contains(&self, index: u64) -> bool {
        self.indices.contains(&index)
    }

    /// Most recent index, if any record exists.
    pub fn latest(&self) -> Option<u64> {
        self.indices.last().copied()
    }

    /// Greatest index strictly less than `index`.
    pub fn predecessor_of(&self, index: u64) -> Option<u64> {
        self.indices.range(..index).next_back().copied()
    }

    /// Smallest index strictly greater than `index`.
    pub fn successor_of(&self, index: u64) -> Option<u64> {
        self.indices.range(index + 1..).next().copied()
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}
