//! Annotation state data model
//!
//! The serialized geometry a rendering surface reports: an ordered
//! collection of strokes plus the viewport it was drawn in. A state is
//! treated as an opaque immutable value once the core observes it; the
//! store never mutates it in place.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A point in image coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// The visible region of the tiled image when the state was captured
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    /// Zoom level of the tile pyramid view
    pub zoom: f64,
    /// Center of the visible region
    pub center: Point,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            zoom: 0.0,
            center: Point::new(0.0, 0.0),
        }
    }
}

/// A single free-form stroke
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stroke {
    /// Polyline vertices in drawing order
    pub points: Vec<Point>,
    /// Stroke color (CSS color value)
    pub color: String,
    /// Line thickness in pixels
    pub weight: f64,
}

impl Stroke {
    pub fn new(points: Vec<Point>, color: &str, weight: f64) -> Self {
        Self {
            points,
            color: color.to_string(),
            weight,
        }
    }
}

/// A complete annotation state as reported by the rendering surface
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotationState {
    /// Viewport the state was captured in
    pub viewport: Viewport,
    /// Strokes in insertion order
    pub strokes: Vec<Stroke>,
}

impl AnnotationState {
    /// An empty state at the default viewport
    pub fn empty() -> Self {
        Self {
            viewport: Viewport::default(),
            strokes: Vec::new(),
        }
    }

    pub fn new(viewport: Viewport, strokes: Vec<Stroke>) -> Self {
        Self { viewport, strokes }
    }

    /// Return a copy with one more stroke appended
    pub fn with_stroke(&self, stroke: Stroke) -> Self {
        let mut next = self.clone();
        next.strokes.push(stroke);
        next
    }
}

/// An immutable, indexed, persisted annotation state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    /// Position in the session's live sequence
    pub index: u64,
    /// When the record was appended
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    /// The captured geometry
    pub state: AnnotationState,
}

impl Snapshot {
    pub fn new(index: u64, state: AnnotationState) -> Self {
        Self {
            index,
            created_at: Utc::now(),
            state,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_stroke_leaves_original_untouched() {
        let base = AnnotationState::empty();
        let next = base.with_stroke(Stroke::new(
            vec![Point::new(1.0, 2.0), Point::new(3.0, 4.0)],
            "#ff0000",
            2.0,
        ));

        assert!(base.strokes.is_empty());
        assert_eq!(next.strokes.len(), 1);
        assert_eq!(next.strokes[0].color, "#ff0000");
    }

    #[test]
    fn test_snapshot_serialization() {
        let state = AnnotationState::empty()
            .with_stroke(Stroke::new(vec![Point::new(0.5, 0.5)], "#00ff00", 1.5));
        let snapshot = Snapshot::new(47, state);

        let json = serde_json::to_string_pretty(&snapshot).unwrap();
        assert!(json.contains("createdAt"));
        assert!(json.contains("#00ff00"));

        let parsed: Snapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.index, 47);
        assert_eq!(parsed.state.strokes.len(), 1);
    }
}
