//! Error types for the tilemark core

use std::path::PathBuf;

use thiserror::Error;

/// Crate-wide result type
pub type Result<T> = std::result::Result<T, Error>;

/// Session-core error type
#[derive(Error, Debug)]
pub enum Error {
    /// No snapshot record exists at the requested index.
    #[error("snapshot {0} not found")]
    NotFound(u64),

    /// A stored record exists but could not be decoded. Indicates storage
    /// corruption; callers recover the same way as for `NotFound`.
    #[error("malformed record at {}: {source}", path.display())]
    Serialization {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Undo/redo/bookmark-jump with no valid target. A normal boundary
    /// condition (e.g. undo at the oldest snapshot), not a failure.
    #[error("no {0} target from current position")]
    NoSuchTransition(&'static str),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The session task has shut down and can no longer accept commands.
    #[error("session terminated")]
    SessionClosed,
}

impl Error {
    /// True for the boundary no-op case, which is never logged as an error.
    pub fn is_no_such_transition(&self) -> bool {
        matches!(self, Error::NoSuchTransition(_))
    }
}
