//! Annotation data model and change detection
//!
//! - `types`: the serialized geometry (strokes, viewport) and the
//!   persisted `Snapshot` record
//! - `compare`: structural comparison used to gate auto-save

pub mod compare;
mod types;

pub use types::{AnnotationState, Point, Snapshot, Stroke, Viewport};
