//! Freehand ink stroke entity.

use super::{EntityId, Rgba};
use kurbo::{BezPath, Point, Rect};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A freehand ink stroke: an ordered series of world-space points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrushStroke {
    pub id: EntityId,
    /// Points in the stroke path, append-only while drawing.
    pub points: Vec<Point>,
    pub color: Rgba,
    /// Stroke width in world units.
    pub width: f64,
    /// Fill opacity in [0, 1], applied on top of the color's alpha.
    pub opacity: f64,
}

impl BrushStroke {
    /// Start a new stroke at the given origin.
    pub fn start(origin: Point, color: Rgba, width: f64, opacity: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            points: vec![origin],
            color,
            width,
            opacity,
        }
    }

    /// Add a point to the stroke path.
    pub fn add_point(&mut self, point: Point) {
        self.points.push(point);
    }

    /// A stroke needs at least two points to be worth keeping.
    pub fn is_committable(&self) -> bool {
        self.points.len() >= 2
    }

    pub fn bounds(&self) -> Rect {
        if self.points.is_empty() {
            return Rect::ZERO;
        }

        let mut min_x = f64::MAX;
        let mut min_y = f64::MAX;
        let mut max_x = f64::MIN;
        let mut max_y = f64::MIN;

        for point in &self.points {
            min_x = min_x.min(point.x);
            min_y = min_y.min(point.y);
            max_x = max_x.max(point.x);
            max_y = max_y.max(point.y);
        }

        Rect::new(min_x, min_y, max_x, max_y)
    }

    /// Polyline path through all points.
    pub fn to_path(&self) -> BezPath {
        let mut path = BezPath::new();

        if self.points.is_empty() {
            return path;
        }

        path.move_to(self.points[0]);
        for point in self.points.iter().skip(1) {
            path.line_to(*point);
        }

        path
    }
}
