//! Single-session editing core
//!
//! - `navigation`: the undo/redo/bookmark-jump state machine and the
//!   protection state that gates auto-save during history loads
//! - `runtime`: the per-session actor tying storage, navigation, status
//!   and the auto-save scheduler together on one task
//! - `status`: the per-session done flag record

mod navigation;
mod runtime;
mod status;

pub use navigation::{ConfirmOutcome, NavigationController, Protection};
pub use runtime::{Command, SessionHandle, SessionInfo, SessionRuntime};
pub use status::SessionStatus;
