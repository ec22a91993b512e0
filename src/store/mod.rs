//! Durable per-session storage
//!
//! One storage namespace per session:
//!
//! ```text
//! <data_dir>/<session_id>/
//!     live/00000.json ...   append-only snapshot records
//!     bookmarks.json        ordered list of bookmarked indices
//!     status.json           session status record
//! ```
//!
//! All writes go through [`write_json_atomic`]: serialize to a temp file in
//! the target directory, then rename over the final name, so a record is
//! never partially visible to readers.

mod bookmarks;
mod paths;
mod snapshot;

pub use bookmarks::BookmarkIndex;
pub use paths::{list_sessions, SessionPaths};
pub use snapshot::SnapshotStore;

use std::path::Path;

use serde::Serialize;

use crate::error::{Error, Result};

/// Serialize `value` and atomically replace the file at `path`.
pub(crate) async fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_vec_pretty(value).map_err(|source| Error::Serialization {
        path: path.to_path_buf(),
        source,
    })?;

    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("record.json");
    let tmp = path.with_file_name(format!(".{file_name}.tmp"));

    tokio::fs::write(&tmp, &json).await?;
    if let Err(e) = tokio::fs::rename(&tmp, path).await {
        // Leave no temp file behind if the rename itself failed.
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(e.into());
    }
    Ok(())
}
