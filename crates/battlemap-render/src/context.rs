//! Render context and renderer abstraction.

use battlemap_core::Session;
use kurbo::Size;
use peniko::Color;
use thiserror::Error;

/// Renderer errors.
#[derive(Debug, Error)]
pub enum RendererError {
    #[error("Initialization failed: {0}")]
    InitFailed(String),
    #[error("Render failed: {0}")]
    RenderFailed(String),
}

/// Result type for renderer operations.
pub type RenderResult<T> = Result<T, RendererError>;

/// Context for a single render frame.
pub struct RenderContext<'a> {
    /// The session to render.
    pub session: &'a Session,
    /// Viewport size in logical pixels.
    pub viewport_size: Size,
    /// Device pixel ratio (for HiDPI).
    pub scale_factor: f64,
    /// Background color behind the map image.
    pub background_color: Color,
    /// Outline color for selected vision blocks.
    pub selection_color: Color,
    /// Outline color for the selected token.
    pub token_selection_color: Color,
}

impl<'a> RenderContext<'a> {
    /// Create a new render context with default colors.
    pub fn new(session: &'a Session, viewport_size: Size) -> Self {
        Self {
            session,
            viewport_size,
            scale_factor: 1.0,
            background_color: Color::from_rgba8(229, 231, 235, 255),
            selection_color: Color::from_rgba8(255, 0, 0, 255),
            token_selection_color: Color::from_rgba8(255, 255, 0, 255),
        }
    }

    /// Set the scale factor for HiDPI.
    pub fn with_scale_factor(mut self, scale_factor: f64) -> Self {
        self.scale_factor = scale_factor;
        self
    }

    /// Set the background color.
    pub fn with_background(mut self, color: Color) -> Self {
        self.background_color = color;
        self
    }

    /// Set the selection highlight colors.
    pub fn with_selection_colors(mut self, blocks: Color, token: Color) -> Self {
        self.selection_color = blocks;
        self.token_selection_color = token;
        self
    }
}

/// Trait for rendering backends.
pub trait Renderer: Send + Sync {
    /// Build the scene/command buffer for a frame.
    ///
    /// Called once per frame; prepares all drawing commands.
    fn build_scene(&mut self, ctx: &RenderContext);

    /// Get the background color (for clearing).
    fn background_color(&self, ctx: &RenderContext) -> Color {
        ctx.background_color
    }
}
