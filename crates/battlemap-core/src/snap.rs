//! Grid snapping and grid-size limits.

use kurbo::Point;

/// Minimum grid size in world units.
pub const GRID_MIN: f64 = 10.0;
/// Maximum grid size in world units.
pub const GRID_MAX: f64 = 80.0;
/// Default grid size.
pub const DEFAULT_GRID_SIZE: f64 = 40.0;

/// Snap a scalar to the nearest grid multiple.
pub fn snap_scalar(value: f64, grid_size: f64) -> f64 {
    (value / grid_size).round() * grid_size
}

/// Snap a point to the nearest grid intersection, each axis independently.
pub fn snap_to_grid(point: Point, grid_size: f64) -> Point {
    Point::new(
        snap_scalar(point.x, grid_size),
        snap_scalar(point.y, grid_size),
    )
}

/// Clamp a grid size into the supported range.
pub fn clamp_grid_size(size: f64) -> f64 {
    size.clamp(GRID_MIN, GRID_MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snap_rounds_to_nearest() {
        let snapped = snap_to_grid(Point::new(5.0, 5.0), 40.0);
        assert_eq!(snapped, Point::new(0.0, 0.0));

        let snapped = snap_to_grid(Point::new(83.0, 77.0), 40.0);
        assert_eq!(snapped, Point::new(80.0, 80.0));

        // Each axis snaps independently
        let snapped = snap_to_grid(Point::new(19.0, 21.0), 40.0);
        assert_eq!(snapped, Point::new(0.0, 40.0));
    }

    #[test]
    fn test_snap_is_idempotent() {
        for (x, y) in [(5.0, 5.0), (-13.0, 97.5), (60.0, -60.0)] {
            let once = snap_to_grid(Point::new(x, y), 40.0);
            let twice = snap_to_grid(once, 40.0);
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn test_snap_result_on_grid() {
        for (x, y) in [(33.0, -7.0), (123.4, 567.8)] {
            let snapped = snap_to_grid(Point::new(x, y), 40.0);
            assert!((snapped.x / 40.0).fract().abs() < f64::EPSILON);
            assert!((snapped.y / 40.0).fract().abs() < f64::EPSILON);
        }
    }

    #[test]
    fn test_clamp_grid_size() {
        assert!((clamp_grid_size(5.0) - GRID_MIN).abs() < f64::EPSILON);
        assert!((clamp_grid_size(100.0) - GRID_MAX).abs() < f64::EPSILON);
        assert!((clamp_grid_size(40.0) - 40.0).abs() < f64::EPSILON);
    }
}
