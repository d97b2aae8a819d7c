//! Vision-blocking shapes: opaque regions the players cannot see through.

use super::{EntityId, Rgba};
use kurbo::{BezPath, Point, Rect};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Minimum width and height (world units) for a rect block to be kept.
pub const MIN_RECT_EXTENT: f64 = 5.0;
/// Minimum point count for a freehand block to be kept.
pub const MIN_FREEHAND_POINTS: usize = 3;

/// Rectangular vision block, stored as the raw drag corners.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RectBlock {
    pub id: EntityId,
    #[serde(rename = "startX")]
    pub start_x: f64,
    #[serde(rename = "startY")]
    pub start_y: f64,
    #[serde(rename = "endX")]
    pub end_x: f64,
    #[serde(rename = "endY")]
    pub end_y: f64,
    pub color: Rgba,
    pub opacity: f64,
}

impl RectBlock {
    /// Begin a rect block drag; both corners start at the origin.
    pub fn start(origin: Point, color: Rgba, opacity: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            start_x: origin.x,
            start_y: origin.y,
            end_x: origin.x,
            end_y: origin.y,
            color,
            opacity,
        }
    }

    /// Move the drag corner.
    pub fn drag_to(&mut self, point: Point) {
        self.end_x = point.x;
        self.end_y = point.y;
    }

    /// Normalized rectangle; the stored corners may be in any order.
    pub fn rect(&self) -> Rect {
        Rect::from_points(
            Point::new(self.start_x, self.start_y),
            Point::new(self.end_x, self.end_y),
        )
    }

    pub fn width(&self) -> f64 {
        (self.end_x - self.start_x).abs()
    }

    pub fn height(&self) -> f64 {
        (self.end_y - self.start_y).abs()
    }

    /// Blocks thinner than the minimum extent in either axis are discarded.
    pub fn is_committable(&self) -> bool {
        self.width() > MIN_RECT_EXTENT && self.height() > MIN_RECT_EXTENT
    }

    /// Point-in-AABB hit test, edges inclusive.
    pub fn hit_test(&self, point: Point) -> bool {
        let r = self.rect();
        point.x >= r.x0 && point.x <= r.x1 && point.y >= r.y0 && point.y <= r.y1
    }
}

/// Freehand vision block: a polygon auto-closed back to its first point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FreehandBlock {
    pub id: EntityId,
    /// Polygon vertices in world space.
    pub points: Vec<Point>,
    pub color: Rgba,
    pub opacity: f64,
}

impl FreehandBlock {
    /// Begin a freehand block trace at the given origin.
    pub fn start(origin: Point, color: Rgba, opacity: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            points: vec![origin],
            color,
            opacity,
        }
    }

    /// Add a vertex to the trace.
    pub fn add_point(&mut self, point: Point) {
        self.points.push(point);
    }

    /// A polygon needs at least three vertices to enclose anything.
    pub fn is_committable(&self) -> bool {
        self.points.len() >= MIN_FREEHAND_POINTS
    }

    /// Even-odd membership test against the closed polygon.
    pub fn hit_test(&self, point: Point) -> bool {
        point_in_polygon(point, &self.points)
    }

    /// Closed polygon path.
    pub fn to_path(&self) -> BezPath {
        let mut path = BezPath::new();

        if self.points.is_empty() {
            return path;
        }

        path.move_to(self.points[0]);
        for point in self.points.iter().skip(1) {
            path.line_to(*point);
        }
        path.close_path();

        path
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
}

/// A vision-blocking shape, rectangular or freehand-polygonal.
///
/// Serializes with an explicit `"type"` tag so saved files stay readable
/// by external tooling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum VisionBlock {
    Rect(RectBlock),
    Freehand(FreehandBlock),
}

impl VisionBlock {
    pub fn id(&self) -> EntityId {
        match self {
            VisionBlock::Rect(block) => block.id,
            VisionBlock::Freehand(block) => block.id,
        }
    }

    pub fn color(&self) -> Rgba {
        match self {
            VisionBlock::Rect(block) => block.color,
            VisionBlock::Freehand(block) => block.color,
        }
    }

    pub fn opacity(&self) -> f64 {
        match self {
            VisionBlock::Rect(block) => block.opacity,
            VisionBlock::Freehand(block) => block.opacity,
        }
    }

    pub fn hit_test(&self, point: Point) -> bool {
        match self {
            VisionBlock::Rect(block) => block.hit_test(point),
            VisionBlock::Freehand(block) => block.hit_test(point),
        }
    }

    pub fn bounds(&self) -> Rect {
        match self {
            VisionBlock::Rect(block) => block.rect(),
            VisionBlock::Freehand(block) => block.bounds(),
        }
    }
}

/// Even-odd ray-casting point-in-polygon test.
///
/// Casts a horizontal ray to the right and counts edge crossings. Fewer
/// than three vertices never contain anything.
pub fn point_in_polygon(point: Point, polygon: &[Point]) -> bool {
    if polygon.len() < 3 {
        return false;
    }

    let mut inside = false;
    let mut j = polygon.len() - 1;
    for i in 0..polygon.len() {
        let pi = polygon[i];
        let pj = polygon[j];

        if (pi.y > point.y) != (pj.y > point.y) {
            let x_cross = (pj.x - pi.x) * (point.y - pi.y) / (pj.y - pi.y) + pi.x;
            if point.x < x_cross {
                inside = !inside;
            }
        }
        j = i;
    }

    inside
}
