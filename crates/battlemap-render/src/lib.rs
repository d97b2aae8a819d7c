//! Battlemap renderer
//!
//! Builds a `vello::Scene` from a session snapshot in a fixed layer order:
//! background map, grid, vision blocks, block preview, ink strokes, stroke
//! preview, tokens. Rendering is a pure function of the session state; the
//! renderer owns only caches (decoded background image, font contexts).

mod context;
mod scene;

pub use context::{RenderContext, RenderResult, Renderer, RendererError};
pub use scene::MapRenderer;
