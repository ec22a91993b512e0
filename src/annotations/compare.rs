//! Structural change detection between annotation states
//!
//! Decides whether a freshly observed state differs from the last persisted
//! one. Comparison is order-sensitive over strokes and field-by-field over
//! geometry, with small float tolerances so that rendering round trips do
//! not register as edits.

use super::types::AnnotationState;

/// Zoom levels closer than this are considered equal
const ZOOM_EPSILON: f64 = 0.01;
/// Viewport centers closer than this are considered equal
const CENTER_EPSILON: f64 = 0.1;
/// Stroke vertices closer than this are considered equal
const POINT_EPSILON: f64 = 0.001;

/// True iff `candidate` should be appended as a new snapshot.
///
/// A missing last-saved state always counts as changed: the first state a
/// session observes is persisted unconditionally.
pub fn should_save(candidate: &AnnotationState, last_saved: Option<&AnnotationState>) -> bool {
    match last_saved {
        None => true,
        Some(last) => states_differ(candidate, last),
    }
}

/// Order-sensitive structural comparison of two states.
pub fn states_differ(a: &AnnotationState, b: &AnnotationState) -> bool {
    if (a.viewport.zoom - b.viewport.zoom).abs() > ZOOM_EPSILON {
        return true;
    }
    if (a.viewport.center.x - b.viewport.center.x).abs() > CENTER_EPSILON
        || (a.viewport.center.y - b.viewport.center.y).abs() > CENTER_EPSILON
    {
        return true;
    }

    if a.strokes.len() != b.strokes.len() {
        return true;
    }

    for (sa, sb) in a.strokes.iter().zip(&b.strokes) {
        if sa.color != sb.color || sa.weight != sb.weight {
            return true;
        }
        if sa.points.len() != sb.points.len() {
            return true;
        }
        for (pa, pb) in sa.points.iter().zip(&sb.points) {
            if (pa.x - pb.x).abs() > POINT_EPSILON || (pa.y - pb.y).abs() > POINT_EPSILON {
                return true;
            }
        }
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotations::types::{Point, Stroke, Viewport};

    fn state_with_stroke() -> AnnotationState {
        AnnotationState::new(
            Viewport {
                zoom: 3.0,
                center: Point::new(100.0, 200.0),
            },
            vec![Stroke::new(
                vec![Point::new(1.0, 1.0), Point::new(2.0, 2.0)],
                "#ff0000",
                2.0,
            )],
        )
    }

    #[test]
    fn test_identical_states_do_not_save() {
        let a = state_with_stroke();
        let b = a.clone();
        assert!(!should_save(&a, Some(&b)));
    }

    #[test]
    fn test_missing_last_saved_always_saves() {
        assert!(should_save(&AnnotationState::empty(), None));
    }

    #[test]
    fn test_jitter_below_tolerance_is_equal() {
        let a = state_with_stroke();
        let mut b = a.clone();
        b.viewport.zoom += 0.005;
        b.viewport.center.x += 0.05;
        b.strokes[0].points[0].x += 0.0005;
        assert!(!states_differ(&a, &b));
    }

    #[test]
    fn test_added_stroke_is_a_change() {
        let a = state_with_stroke();
        let b = a.with_stroke(Stroke::new(vec![Point::new(5.0, 5.0)], "#0000ff", 1.0));
        assert!(states_differ(&a, &b));
    }

    #[test]
    fn test_moved_vertex_is_a_change() {
        let a = state_with_stroke();
        let mut b = a.clone();
        b.strokes[0].points[1].y += 0.01;
        assert!(states_differ(&a, &b));
    }

    #[test]
    fn test_color_and_weight_compare_exactly() {
        let a = state_with_stroke();
        let mut b = a.clone();
        b.strokes[0].weight = 2.5;
        assert!(states_differ(&a, &b));

        let mut c = a.clone();
        c.strokes[0].color = "#ff0001".to_string();
        assert!(states_differ(&a, &c));
    }

    #[test]
    fn test_comparison_is_order_sensitive() {
        // Same strokes, different insertion order: counts as a change.
        let red = Stroke::new(vec![Point::new(1.0, 1.0)], "#ff0000", 2.0);
        let blue = Stroke::new(vec![Point::new(9.0, 9.0)], "#0000ff", 2.0);

        let a = AnnotationState::new(Viewport::default(), vec![red.clone(), blue.clone()]);
        let b = AnnotationState::new(Viewport::default(), vec![blue, red]);
        assert!(states_differ(&a, &b));
    }

    #[test]
    fn test_zoom_change_is_a_change() {
        let a = state_with_stroke();
        let mut b = a.clone();
        b.viewport.zoom += 0.5;
        assert!(states_differ(&a, &b));
    }
}
