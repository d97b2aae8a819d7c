//! Token entity: a labeled circular marker on the map.

use super::{EntityId, Rgba};
use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Size class of a token, as a multiplier of the grid size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SizeClass {
    Tiny,
    #[default]
    Normal,
    Large,
}

impl SizeClass {
    /// Grid-size multiplier for this class.
    pub fn multiplier(self) -> f64 {
        match self {
            SizeClass::Tiny => 0.5,
            SizeClass::Normal => 0.9,
            SizeClass::Large => 1.8,
        }
    }
}

/// A circular, labeled token placed on the map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    pub id: EntityId,
    /// World-space position of the token center.
    pub x: f64,
    pub y: f64,
    pub color: Rgba,
    pub label: String,
    /// Diameter in world units, derived from grid size and size class.
    pub size: f64,
    #[serde(rename = "sizeClass", default)]
    pub size_class: SizeClass,
}

impl Token {
    /// Create a new token centered at the given world position.
    pub fn new(
        position: Point,
        color: Rgba,
        label: String,
        grid_size: f64,
        size_class: SizeClass,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            x: position.x,
            y: position.y,
            color,
            label,
            size: grid_size * size_class.multiplier(),
            size_class,
        }
    }

    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn set_position(&mut self, position: Point) {
        self.x = position.x;
        self.y = position.y;
    }

    /// Recompute the diameter after a grid-size change.
    pub fn rescale(&mut self, grid_size: f64) {
        self.size = grid_size * self.size_class.multiplier();
    }

    /// Circular hit test against the token's world-space footprint.
    pub fn hit_test(&self, point: Point) -> bool {
        let dx = point.x - self.x;
        let dy = point.y - self.y;
        (dx * dx + dy * dy).sqrt() <= self.size / 2.0
    }

    pub fn bounds(&self) -> Rect {
        let r = self.size / 2.0;
        Rect::new(self.x - r, self.y - r, self.x + r, self.y + r)
    }
}
