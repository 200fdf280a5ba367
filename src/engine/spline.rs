//! Spline evaluation for curved tracks
//!
//! Pure math over a track's control points: position-at-parameter,
//! sampled closest-point, and arc-length queries. No engine state.

use ordered_float::OrderedFloat;

use super::types::{Vec2, ARC_LENGTH_SAMPLES, CLOSEST_POINT_SAMPLES};

/// Result of a closest-point query against a control-point sequence.
#[derive(Debug, Clone, Copy)]
pub struct ClosestPoint {
    /// Parameter in [0,1] of the best sample.
    pub t: f32,
    /// Position of the best sample.
    pub position: Vec2,
    /// Euclidean distance from the query target to `position`.
    pub distance: f32,
}

/// Evaluates the point at parameter `t` in [0,1].
///
/// Zero points is degenerate and yields the origin. One point is constant.
/// Two points interpolate linearly. Three or more evaluate piecewise
/// Catmull-Rom with neighbor indices clamped at the ends, so the curve
/// passes through every control point and never extrapolates: `t` is
/// clamped before use.
pub fn position_at(points: &[Vec2], t: f32) -> Vec2 {
    match points.len() {
        0 => Vec2::ZERO,
        1 => points[0],
        2 => points[0].lerp(&points[1], t.clamp(0.0, 1.0)),
        _ => {
            let t = t.clamp(0.0, 1.0);
            let segments = points.len() - 1;
            let scaled = t * segments as f32;
            let seg = (scaled.floor() as usize).min(segments - 1);
            let u = scaled - seg as f32;

            let p0 = points[seg.saturating_sub(1)];
            let p1 = points[seg];
            let p2 = points[seg + 1];
            let p3 = points[(seg + 2).min(points.len() - 1)];

            catmull_rom(p0, p1, p2, p3, u)
        }
    }
}

/// Standard Catmull-Rom basis on one segment, local parameter `u` in [0,1].
fn catmull_rom(p0: Vec2, p1: Vec2, p2: Vec2, p3: Vec2, u: f32) -> Vec2 {
    let u2 = u * u;
    let u3 = u2 * u;

    let component = |c0: f32, c1: f32, c2: f32, c3: f32| {
        0.5 * ((2.0 * c1)
            + (-c0 + c2) * u
            + (2.0 * c0 - 5.0 * c1 + 4.0 * c2 - c3) * u2
            + (-c0 + 3.0 * c1 - 3.0 * c2 + c3) * u3)
    };

    Vec2::new(
        component(p0.x, p1.x, p2.x, p3.x),
        component(p0.y, p1.y, p2.y, p3.y),
    )
}

/// Finds the sampled point nearest to `target`.
///
/// Fixed-step sampling over `CLOSEST_POINT_SAMPLES` steps. This is a
/// documented approximation: curves with sharp self-intersection may
/// resolve to a locally-wrong match.
pub fn closest_point(points: &[Vec2], target: Vec2) -> ClosestPoint {
    let mut best = ClosestPoint {
        t: 0.0,
        position: position_at(points, 0.0),
        distance: f32::INFINITY,
    };

    for i in 0..=CLOSEST_POINT_SAMPLES {
        let t = i as f32 / CLOSEST_POINT_SAMPLES as f32;
        let position = position_at(points, t);
        let distance = target.distance(&position);
        if OrderedFloat(distance) < OrderedFloat(best.distance) {
            best = ClosestPoint {
                t,
                position,
                distance,
            };
        }
    }

    best
}

/// Estimates total curve length by summing short chords.
pub fn arc_length(points: &[Vec2]) -> f32 {
    if points.len() < 2 {
        return 0.0;
    }

    let mut length = 0.0;
    let mut prev = position_at(points, 0.0);
    for i in 1..=ARC_LENGTH_SAMPLES {
        let t = i as f32 / ARC_LENGTH_SAMPLES as f32;
        let next = position_at(points, t);
        length += prev.distance(&next);
        prev = next;
    }
    length
}

/// Converts a pixel distance into the equivalent parametric delta on this
/// curve. Degenerate curves (zero length) map any distance to zero.
pub fn delta_for_pixels(points: &[Vec2], pixels: f32) -> f32 {
    let length = arc_length(points);
    if length <= f32::EPSILON {
        0.0
    } else {
        pixels / length
    }
}

/// Searches the progress range from `t_near` toward `t_far` for the value
/// whose pixel distance to `anchor` best matches `target_distance`.
///
/// Assumes distance-to-anchor grows monotonically from `t_near` to `t_far`
/// (true on the single-sided ranges the drag engine passes in; position as
/// a function of progress is nonlinear on curves, hence the search rather
/// than a parametric offset). `t_near` may be numerically above `t_far`.
pub fn find_progress_at_distance(
    points: &[Vec2],
    anchor: Vec2,
    target_distance: f32,
    t_near: f32,
    t_far: f32,
) -> f32 {
    let mut near = t_near;
    let mut far = t_far;

    for _ in 0..40 {
        let mid = (near + far) * 0.5;
        let d = anchor.distance(&position_at(points, mid));
        if d < target_distance {
            near = mid;
        } else {
            far = mid;
        }
    }

    ((near + far) * 0.5).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: f32 = 1e-3;

    #[test]
    fn empty_points_evaluate_to_origin() {
        let p = position_at(&[], 0.5);
        assert_eq!(p, Vec2::ZERO);
    }

    #[test]
    fn single_point_is_constant() {
        let points = [Vec2::new(3.0, 4.0)];
        for t in [0.0, 0.25, 1.0] {
            assert_eq!(position_at(&points, t), points[0]);
        }
    }

    #[test]
    fn two_points_interpolate_linearly() {
        let points = [Vec2::new(0.0, 0.0), Vec2::new(100.0, 0.0)];
        for i in 0..=10 {
            let t = i as f32 / 10.0;
            let p = position_at(&points, t);
            assert!((p.x - 100.0 * t).abs() < TOLERANCE);
            assert!(p.y.abs() < TOLERANCE);
        }
    }

    #[test]
    fn midpoint_of_straight_track() {
        // Track = [(0,0),(100,0)], progress 0.5 => position (50,0).
        let points = [Vec2::new(0.0, 0.0), Vec2::new(100.0, 0.0)];
        let p = position_at(&points, 0.5);
        assert!((p.x - 50.0).abs() < TOLERANCE);
        assert!(p.y.abs() < TOLERANCE);
    }

    #[test]
    fn endpoints_are_exact_for_any_count() {
        let curves: Vec<Vec<Vec2>> = vec![
            vec![Vec2::new(1.0, 2.0), Vec2::new(3.0, 4.0)],
            vec![Vec2::new(0.0, 0.0), Vec2::new(50.0, 80.0), Vec2::new(100.0, 0.0)],
            vec![
                Vec2::new(0.0, 0.0),
                Vec2::new(30.0, 40.0),
                Vec2::new(70.0, 40.0),
                Vec2::new(100.0, 0.0),
            ],
        ];

        for points in &curves {
            let first = position_at(points, 0.0);
            let last = position_at(points, 1.0);
            assert!(first.distance(&points[0]) < TOLERANCE);
            assert!(last.distance(points.last().unwrap()) < TOLERANCE);
        }
    }

    #[test]
    fn out_of_range_parameter_clamps() {
        let points = [Vec2::new(0.0, 0.0), Vec2::new(10.0, 0.0), Vec2::new(20.0, 0.0)];
        assert!(position_at(&points, -1.0).distance(&points[0]) < TOLERANCE);
        assert!(position_at(&points, 2.0).distance(&points[2]) < TOLERANCE);
    }

    #[test]
    fn catmull_rom_passes_through_control_points() {
        let points = [
            Vec2::new(0.0, 0.0),
            Vec2::new(50.0, 30.0),
            Vec2::new(100.0, 0.0),
        ];
        // Interior control point sits at t = 0.5 for 3 points.
        let mid = position_at(&points, 0.5);
        assert!(mid.distance(&points[1]) < TOLERANCE);
    }

    #[test]
    fn closest_point_on_straight_track() {
        let points = [Vec2::new(0.0, 0.0), Vec2::new(100.0, 0.0)];
        let hit = closest_point(&points, Vec2::new(40.0, 10.0));
        assert!((hit.t - 0.4).abs() < 0.02);
        assert!((hit.distance - 10.0).abs() < 0.5);
    }

    #[test]
    fn arc_length_of_straight_line() {
        let points = [Vec2::new(0.0, 0.0), Vec2::new(300.0, 400.0)];
        assert!((arc_length(&points) - 500.0).abs() < 0.5);
        assert!(arc_length(&points[..1]) == 0.0);
    }

    #[test]
    fn delta_for_pixels_matches_line_length() {
        let points = [Vec2::new(0.0, 0.0), Vec2::new(1000.0, 0.0)];
        assert!((delta_for_pixels(&points, 100.0) - 0.1).abs() < 1e-4);
        assert_eq!(delta_for_pixels(&[Vec2::ZERO], 100.0), 0.0);
    }

    #[test]
    fn progress_search_hits_target_distance() {
        let points = [Vec2::new(0.0, 0.0), Vec2::new(1000.0, 0.0)];
        let anchor = position_at(&points, 0.5);
        // Search below the anchor for a point 58px behind it.
        let t = find_progress_at_distance(&points, anchor, 58.0, 0.5, 0.0);
        let found = position_at(&points, t);
        assert!((anchor.distance(&found) - 58.0).abs() < 0.1);
        assert!(t < 0.5);
    }
}
