//! Tilemark
//!
//! Versioned annotation history for tiled-image viewers: an append-only,
//! monotonically indexed log of annotation states per editing session,
//! with undo/redo and bookmark navigation that stays consistent while a
//! periodic auto-save races against it.
//!
//! The hard part is the race: loading an old state during undo looks, to a
//! periodic change detector, exactly like a fresh user edit. The
//! [`session`] module's protection state machine suppresses auto-save
//! while a historical load is outstanding and for a trailing grace window
//! after it is confirmed, so navigation never duplicates history.
//!
//! Tile serving, the rendering surface and authentication are external
//! collaborators; the surface is reached only through the [`surface`]
//! seam.

pub mod annotations;
pub mod config;
pub mod error;
pub mod session;
pub mod store;
pub mod surface;

pub use config::Config;
pub use error::{Error, Result};
