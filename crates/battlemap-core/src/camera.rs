//! Camera module for pan/zoom transforms.

use kurbo::{Affine, Point, Size, Vec2};
use serde::{Deserialize, Serialize};

/// Minimum allowed zoom level.
pub const MIN_ZOOM: f64 = 0.5;
/// Maximum allowed zoom level.
pub const MAX_ZOOM: f64 = 6.0;

/// Camera manages the view transform for the map canvas.
///
/// It handles panning (translation) and zooming (scaling) operations,
/// converting between screen coordinates and world coordinates. Unlike a
/// plain scale-then-translate camera, scaling is anchored at the viewport
/// center, so zooming with a centered cursor leaves the view centered.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Camera {
    /// Current translation offset (pan), in screen pixels.
    pub offset: Vec2,
    /// Current zoom level.
    pub zoom: f64,
    /// Scale anchor: the viewport center in screen coordinates.
    pub center: Point,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            offset: Vec2::ZERO,
            zoom: 1.0,
            center: Point::new(400.0, 300.0),
        }
    }
}

impl Camera {
    /// Create a new camera with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the affine transform for rendering.
    ///
    /// This transform converts world coordinates to screen coordinates:
    /// `screen = (world - center) * zoom + center + offset`.
    pub fn transform(&self) -> Affine {
        Affine::translate(self.center.to_vec2() + self.offset)
            * Affine::scale(self.zoom)
            * Affine::translate(-self.center.to_vec2())
    }

    /// Get the inverse transform for input handling.
    ///
    /// This transform converts screen coordinates to world coordinates:
    /// `world = (screen - center - offset) / zoom + center`.
    pub fn inverse_transform(&self) -> Affine {
        Affine::translate(self.center.to_vec2())
            * Affine::scale(1.0 / self.zoom)
            * Affine::translate(-(self.center.to_vec2() + self.offset))
    }

    /// Convert a screen point to world coordinates.
    pub fn screen_to_world(&self, screen_point: Point) -> Point {
        self.inverse_transform() * screen_point
    }

    /// Convert a world point to screen coordinates.
    pub fn world_to_screen(&self, world_point: Point) -> Point {
        self.transform() * world_point
    }

    /// Pan the camera by a delta in screen coordinates.
    pub fn pan(&mut self, delta: Vec2) {
        self.offset += delta;
    }

    /// Zoom the camera, keeping the given screen point fixed.
    pub fn zoom_at(&mut self, screen_point: Point, factor: f64) {
        let new_zoom = (self.zoom * factor).clamp(MIN_ZOOM, MAX_ZOOM);
        if (new_zoom - self.zoom).abs() < f64::EPSILON {
            return;
        }

        // Convert screen point to world before zoom
        let world_point = self.screen_to_world(screen_point);

        // Apply new zoom
        self.zoom = new_zoom;

        // Adjust offset so world_point stays at screen_point
        let new_screen = self.world_to_screen(world_point);
        let correction = Vec2::new(
            screen_point.x - new_screen.x,
            screen_point.y - new_screen.y,
        );
        self.offset += correction;
    }

    /// Zoom from a wheel event. Scrolling down zooms out, up zooms in.
    pub fn wheel_zoom(&mut self, screen_point: Point, scroll_y: f64) {
        if scroll_y == 0.0 {
            return;
        }
        let factor = if scroll_y > 0.0 { 0.9 } else { 1.1 };
        self.zoom_at(screen_point, factor);
    }

    /// Set the zoom directly (UI slider), clamped into range.
    pub fn set_zoom(&mut self, zoom: f64) {
        self.zoom = zoom.clamp(MIN_ZOOM, MAX_ZOOM);
    }

    /// Update the scale anchor when the viewport is resized.
    pub fn set_viewport(&mut self, size: Size) {
        self.center = Point::new(size.width / 2.0, size.height / 2.0);
    }

    /// Reset camera to default position and zoom.
    pub fn reset(&mut self) {
        self.offset = Vec2::ZERO;
        self.zoom = 1.0;
    }
}
