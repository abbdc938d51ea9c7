//! Planar geometry helpers for crossing detection.
//!
//! Coordinates are compared as raw degrees. Nothing here projects to meters:
//! both the containment test and the interpolation work on the lat/lon plane.

use geo::{EuclideanDistance, Point};

/// Whether `point` lies inside the axis-aligned rectangle spanned by `a` and
/// `b`, boundary included, whichever way the segment runs.
///
/// This is a coarse stand-in for map matching: the rectangle can contain a
/// stop the vehicle never passed near.
pub fn bbox_contains(a: Point, b: Point, point: Point) -> bool {
    let (min_x, max_x) = min_max(a.x(), b.x());
    let (min_y, max_y) = min_max(a.y(), b.y());

    min_x <= point.x() && point.x() <= max_x && min_y <= point.y() && point.y() <= max_y
}

/// Planar distance between two points, in degrees
pub fn planar_distance(p1: Point, p2: Point) -> f64 {
    p1.euclidean_distance(&p2)
}

/// Fraction of the way from `start` to `end` at which `point` sits, measured
/// as `|start - point| / |start - end|`.
///
/// Returns `None` for a zero-length segment.
pub fn interpolation_fraction(start: Point, end: Point, point: Point) -> Option<f64> {
    let total = planar_distance(start, end);
    if total == 0.0 || !total.is_finite() {
        return None;
    }
    Some(planar_distance(start, point) / total)
}

fn min_max(a: f64, b: f64) -> (f64, f64) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_bbox_contains_any_direction() {
        let stop = Point::new(1.0, 1.0);

        assert!(bbox_contains(Point::new(0.0, 0.0), Point::new(2.0, 2.0), stop));
        assert!(bbox_contains(Point::new(2.0, 2.0), Point::new(0.0, 0.0), stop));
        assert!(bbox_contains(Point::new(0.0, 2.0), Point::new(2.0, 0.0), stop));
        assert!(bbox_contains(Point::new(2.0, 0.0), Point::new(0.0, 2.0), stop));
    }

    #[test]
    fn test_bbox_contains_boundary() {
        // Stop exactly on a segment endpoint
        assert!(bbox_contains(Point::new(1.0, 1.0), Point::new(2.0, 2.0), Point::new(1.0, 1.0)));
        // Horizontal segment, stop on it
        assert!(bbox_contains(Point::new(0.0, 1.0), Point::new(2.0, 1.0), Point::new(1.5, 1.0)));
    }

    #[test]
    fn test_bbox_rejects_outside() {
        assert!(!bbox_contains(Point::new(0.0, 0.0), Point::new(2.0, 2.0), Point::new(3.0, 1.0)));
        assert!(!bbox_contains(Point::new(0.0, 0.0), Point::new(2.0, 2.0), Point::new(1.0, -0.1)));
    }

    #[test]
    fn test_bbox_accepts_off_path_corner() {
        // The rectangle contains the far corner even though the straight
        // path between the pings doesn't pass through it.
        assert!(bbox_contains(Point::new(0.0, 0.0), Point::new(2.0, 2.0), Point::new(2.0, 0.0)));
    }

    #[test]
    fn test_interpolation_midpoint() {
        let fraction =
            interpolation_fraction(Point::new(0.0, 0.0), Point::new(2.0, 2.0), Point::new(1.0, 1.0))
                .unwrap();
        assert_relative_eq!(fraction, 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_interpolation_stays_in_unit_range_inside_box() {
        let start = Point::new(-46.6410, -23.5510);
        let end = Point::new(-46.6350, -23.5480);

        for i in 0..=10 {
            for j in 0..=10 {
                let point = Point::new(
                    -46.6410 + 0.0006 * i as f64,
                    -23.5510 + 0.0003 * j as f64,
                );
                if !bbox_contains(start, end, point) {
                    continue;
                }
                let fraction = interpolation_fraction(start, end, point).unwrap();
                assert!((0.0..=1.0 + 1e-12).contains(&fraction), "fraction {fraction}");
            }
        }
    }

    #[test]
    fn test_interpolation_degenerate_segment() {
        let p = Point::new(-46.63, -23.55);
        assert_eq!(interpolation_fraction(p, p, p), None);
    }
}
