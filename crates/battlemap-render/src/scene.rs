//! Vello scene construction for the battle map.

use crate::context::{RenderContext, Renderer};
use base64::Engine;
use battlemap_core::{BlockPreview, BrushStroke, FreehandBlock, RectBlock, Rgba, Token, VisionBlock};
use kurbo::{Affine, BezPath, Circle, Point, Rect, Shape as KurboShape, Size, Stroke};
use parley::{FontContext, LayoutContext};
use peniko::{Brush, Color, Fill};
use vello::Scene;

/// Decoded background image, cached between frames.
struct BackgroundCache {
    /// The encoded source string the cache was built from.
    key: String,
    image: Option<peniko::ImageData>,
}

/// Vello-based renderer for the battle map.
pub struct MapRenderer {
    /// The Vello scene being built.
    scene: Scene,
    /// Font context for label rendering (cached across frames).
    font_cx: FontContext,
    /// Layout context for label rendering.
    layout_cx: LayoutContext<Brush>,
    /// Decoded background image cache.
    background: Option<BackgroundCache>,
}

impl Default for MapRenderer {
    fn default() -> Self {
        Self::new()
    }
}

/// Bake a layer opacity into a color's alpha channel.
fn with_opacity(color: Rgba, opacity: f64) -> Color {
    let alpha = (color.a as f64 * opacity.clamp(0.0, 1.0)).round() as u8;
    Color::from_rgba8(color.r, color.g, color.b, alpha)
}

/// World rect of the background image: natural resolution, centered in the
/// viewport at zoom 1.
fn background_rect(viewport: Size, width: f64, height: f64) -> Rect {
    let x0 = (viewport.width - width) / 2.0;
    let y0 = (viewport.height - height) / 2.0;
    Rect::new(x0, y0, x0 + width, y0 + height)
}

/// Label font size scales with the grid so text stays legible.
fn label_font_size(grid_size: f64) -> f32 {
    (14.0 * grid_size / 40.0).clamp(12.0, 24.0) as f32
}

impl MapRenderer {
    pub fn new() -> Self {
        Self {
            scene: Scene::new(),
            font_cx: FontContext::new(),
            layout_cx: LayoutContext::new(),
            background: None,
        }
    }

    /// Get the built scene for rendering.
    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// Take ownership of the scene (resets internal scene).
    pub fn take_scene(&mut self) -> Scene {
        std::mem::replace(&mut self.scene, Scene::new())
    }

    /// Decode the background image string, reusing the cached result while
    /// the source string is unchanged. Returns `None` on decode failure.
    fn decode_background(&mut self, data: &str) -> Option<peniko::ImageData> {
        if let Some(cache) = &self.background {
            if cache.key == data {
                return cache.image.clone();
            }
        }

        let image = decode_data_url(data);
        if image.is_none() {
            log::warn!("failed to decode background image");
        }
        self.background = Some(BackgroundCache {
            key: data.to_string(),
            image: image.clone(),
        });
        image
    }

    /// Layer 1: background image. Returns its world bounds when drawn.
    fn render_background(&mut self, ctx: &RenderContext, transform: Affine) -> Option<Rect> {
        let data = ctx.session.background_image.as_deref()?;
        let image_data = self.decode_background(data)?;

        let rect = background_rect(
            ctx.viewport_size,
            image_data.width as f64,
            image_data.height as f64,
        );
        let image_transform = transform * Affine::translate((rect.x0, rect.y0));
        self.scene.draw_image(&image_data.into(), image_transform);
        Some(rect)
    }

    /// Layer 2: grid lines clipped to the map image bounds.
    fn render_grid(&mut self, bounds: Rect, transform: Affine, grid_size: f64) {
        let grid_color = Color::from_rgba8(128, 128, 128, 128);
        let stroke = Stroke::new(1.0);

        let mut x = (bounds.x0 / grid_size).ceil() * grid_size;
        while x <= bounds.x1 {
            let mut path = BezPath::new();
            path.move_to(Point::new(x, bounds.y0));
            path.line_to(Point::new(x, bounds.y1));
            self.scene.stroke(&stroke, transform, grid_color, None, &path);
            x += grid_size;
        }

        let mut y = (bounds.y0 / grid_size).ceil() * grid_size;
        while y <= bounds.y1 {
            let mut path = BezPath::new();
            path.move_to(Point::new(bounds.x0, y));
            path.line_to(Point::new(bounds.x1, y));
            self.scene.stroke(&stroke, transform, grid_color, None, &path);
            y += grid_size;
        }
    }

    /// Layer 3: a committed vision block.
    fn render_block(&mut self, block: &VisionBlock, selected: bool, ctx: &RenderContext, transform: Affine) {
        let fill = with_opacity(block.color(), block.opacity());
        let path = match block {
            VisionBlock::Rect(rect) => rect.rect().to_path(0.1),
            VisionBlock::Freehand(freehand) => freehand.to_path(),
        };
        // Even-odd fill matches the polygon hit test
        self.scene.fill(Fill::EvenOdd, transform, fill, None, &path);

        let (outline, width) = if selected {
            (ctx.selection_color, 2.0)
        } else {
            (Color::from_rgba8(102, 102, 102, 255), 1.0)
        };
        self.scene
            .stroke(&Stroke::new(width), transform, outline, None, &path);
    }

    /// Layer 4: the in-progress vision block preview.
    fn render_block_preview(&mut self, preview: BlockPreview<'_>, transform: Affine) {
        match preview {
            BlockPreview::Rect(block) => self.render_rect_preview(block, transform),
            BlockPreview::Freehand(block) => self.render_freehand_preview(block, transform),
        }
    }

    fn render_rect_preview(&mut self, block: &RectBlock, transform: Affine) {
        let path = block.rect().to_path(0.1);
        let fill = with_opacity(block.color, block.opacity * 0.5);
        self.scene.fill(Fill::NonZero, transform, fill, None, &path);
        self.scene.stroke(
            &Stroke::new(1.0),
            transform,
            Color::from_rgba8(102, 102, 102, 255),
            None,
            &path,
        );
    }

    fn render_freehand_preview(&mut self, block: &FreehandBlock, transform: Affine) {
        if block.points.len() < 2 {
            return;
        }

        let mut path = BezPath::new();
        path.move_to(block.points[0]);
        for point in block.points.iter().skip(1) {
            path.line_to(*point);
        }

        if block.points.len() > 2 {
            // Show the implicit closing edge once the polygon encloses area
            path.line_to(block.points[0]);
            let fill = with_opacity(block.color, block.opacity * 0.5);
            self.scene.fill(Fill::EvenOdd, transform, fill, None, &path);
        }

        let outline = Color::from_rgba8(block.color.r, block.color.g, block.color.b, 255);
        let stroke = Stroke::new(2.0).with_dashes(0.0, [5.0, 5.0]);
        self.scene.stroke(&stroke, transform, outline, None, &path);
    }

    /// Layers 5 and 6: committed strokes and the live preview.
    fn render_stroke(&mut self, stroke: &BrushStroke, transform: Affine) {
        if stroke.points.len() < 2 {
            return;
        }

        let style = Stroke::new(stroke.width)
            .with_caps(kurbo::Cap::Round)
            .with_join(kurbo::Join::Round);
        let color = with_opacity(stroke.color, stroke.opacity);
        self.scene
            .stroke(&style, transform, color, None, &stroke.to_path());
    }

    /// Layer 7: a token with shadow, outline, and label.
    fn render_token(&mut self, token: &Token, selected: bool, ctx: &RenderContext, transform: Affine) {
        let radius = token.size / 2.0;

        let shadow = Circle::new(Point::new(token.x + 2.0, token.y + 2.0), radius);
        self.scene.fill(
            Fill::NonZero,
            transform,
            Color::from_rgba8(0, 0, 0, 77),
            None,
            &shadow,
        );

        let circle = Circle::new(token.position(), radius);
        self.scene
            .fill(Fill::NonZero, transform, Color::from(token.color), None, &circle);

        let (outline, width) = if selected {
            (ctx.token_selection_color, 3.0)
        } else {
            (Color::WHITE, 2.0)
        };
        self.scene
            .stroke(&Stroke::new(width), transform, outline, None, &circle);

        self.render_label(token, ctx.session.grid_size(), transform);
    }

    /// Token label on a dark plate, centered above the circle.
    fn render_label(&mut self, token: &Token, grid_size: f64, transform: Affine) {
        use parley::layout::PositionedLayoutItem;
        use parley::StyleProperty;

        if token.label.is_empty() {
            return;
        }

        let font_size = label_font_size(grid_size);
        let brush = Brush::Solid(Color::WHITE);

        let mut builder = self
            .layout_cx
            .ranged_builder(&mut self.font_cx, &token.label, 1.0, false);
        builder.push_default(StyleProperty::FontSize(font_size));
        builder.push_default(StyleProperty::Brush(brush.clone()));
        builder.push_default(StyleProperty::FontStack(parley::FontStack::Single(
            parley::FontFamily::Generic(parley::GenericFamily::SansSerif),
        )));
        let mut layout = builder.build(&token.label);
        layout.break_all_lines(None);
        layout.align(None, parley::Alignment::Start, parley::AlignmentOptions::default());

        let layout_width = layout.width() as f64;
        let layout_height = layout.height() as f64;

        // Text box top-left, centered horizontally above the token
        let left = token.x - layout_width / 2.0;
        let top = token.y - token.size / 2.0 - layout_height - 6.0;

        let plate = Rect::new(left - 4.0, top - 2.0, left + layout_width + 4.0, top + layout_height + 2.0);
        self.scene.fill(
            Fill::NonZero,
            transform,
            Color::from_rgba8(0, 0, 0, 179),
            None,
            &plate.to_rounded_rect(3.0),
        );

        let text_transform = transform * Affine::translate((left, top));
        let mut glyph_count = 0;

        for line in layout.lines() {
            for item in line.items() {
                let PositionedLayoutItem::GlyphRun(glyph_run) = item else {
                    continue;
                };
                let mut x = glyph_run.offset();
                let y = glyph_run.baseline();
                let run = glyph_run.run();
                let font = run.font();
                let run_font_size = run.font_size();
                let synthesis = run.synthesis();
                let glyph_xform = synthesis
                    .skew()
                    .map(|angle| Affine::skew(angle.to_radians().tan() as f64, 0.0));

                let glyphs: Vec<vello::Glyph> = glyph_run
                    .glyphs()
                    .map(|glyph| {
                        let gx = x + glyph.x;
                        let gy = y - glyph.y;
                        x += glyph.advance;
                        glyph_count += 1;
                        vello::Glyph {
                            id: glyph.id,
                            x: gx,
                            y: gy,
                        }
                    })
                    .collect();

                if !glyphs.is_empty() {
                    self.scene
                        .draw_glyphs(font)
                        .brush(&brush)
                        .hint(true)
                        .transform(text_transform)
                        .glyph_transform(glyph_xform)
                        .font_size(run_font_size)
                        .normalized_coords(run.normalized_coords())
                        .draw(Fill::NonZero, glyphs.into_iter());
                }
            }
        }

        // No usable system font: approximate the text with a light bar so
        // the label position still reads.
        if glyph_count == 0 {
            let width = (token.label.len() as f64 * font_size as f64 * 0.6).max(12.0);
            let bar = Rect::new(
                token.x - width / 2.0,
                top,
                token.x + width / 2.0,
                top + font_size as f64,
            );
            self.scene.fill(
                Fill::NonZero,
                transform,
                Color::from_rgba8(220, 220, 220, 200),
                None,
                &bar,
            );
        }
    }
}

impl Renderer for MapRenderer {
    fn build_scene(&mut self, ctx: &RenderContext) {
        self.scene.reset();
        let session = ctx.session;
        // Camera maps world to logical pixels; the device pixel ratio maps
        // logical to physical pixels on HiDPI surfaces.
        let transform = Affine::scale(ctx.scale_factor) * session.camera.transform();

        // 1. Background map
        let image_bounds = self.render_background(ctx, transform);

        // 2. Grid, clipped to the map and only when a map is loaded
        if session.show_grid {
            if let Some(bounds) = image_bounds {
                self.render_grid(bounds, transform, session.grid_size());
            }
        }

        // 3. Committed vision blocks
        for block in &session.document.vision_blocks {
            let selected = session.is_block_selected(block.id());
            self.render_block(block, selected, ctx, transform);
        }

        // 4. Block preview
        if let Some(preview) = session.current_block() {
            self.render_block_preview(preview, transform);
        }

        // 5. Committed strokes
        for stroke in &session.document.drawings {
            self.render_stroke(stroke, transform);
        }

        // 6. Stroke preview
        if let Some(stroke) = session.current_stroke() {
            self.render_stroke(stroke, transform);
        }

        // 7. Tokens
        for token in &session.document.tokens {
            let selected = session.is_token_selected(token.id);
            self.render_token(token, selected, ctx, transform);
        }
    }
}

/// Decode a base64 (optionally data-URL) image string into RGBA8 pixels.
fn decode_data_url(data: &str) -> Option<peniko::ImageData> {
    use std::sync::Arc;

    let encoded = match data.find("base64,") {
        Some(idx) => &data[idx + "base64,".len()..],
        None => data,
    };

    let bytes = base64::engine::general_purpose::STANDARD
        .decode(encoded.trim())
        .ok()?;
    let decoded = image::load_from_memory(&bytes).ok()?;
    let rgba = decoded.to_rgba8();
    let (width, height) = rgba.dimensions();

    Some(peniko::ImageData {
        data: peniko::Blob::new(Arc::new(rgba.into_vec())),
        format: peniko::ImageFormat::Rgba8,
        width,
        height,
        alpha_type: peniko::ImageAlphaType::Alpha,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use battlemap_core::{Mode, Modifiers, Session};

    fn populated_session() -> Session {
        let mut s = Session::new();
        s.set_mode(Mode::PlacingToken);
        s.token.label = "Hero".to_string();
        s.pointer_down(Point::new(200.0, 200.0), Modifiers::NONE);
        s.pointer_up();

        s.set_mode(Mode::Drawing);
        s.pointer_down(Point::new(10.0, 10.0), Modifiers::NONE);
        s.pointer_move(Point::new(40.0, 40.0));
        s.pointer_up();

        s.set_mode(Mode::VisionBlocking);
        s.pointer_down(Point::new(0.0, 0.0), Modifiers::NONE);
        s.pointer_move(Point::new(120.0, 80.0));
        s.pointer_up();
        s
    }

    #[test]
    fn test_with_opacity() {
        let color = with_opacity(Rgba::new(10, 20, 30, 255), 0.5);
        assert_eq!(color.to_rgba8().a, 128);

        // Out-of-range opacities clamp
        assert_eq!(with_opacity(Rgba::black(), 2.0).to_rgba8().a, 255);
        assert_eq!(with_opacity(Rgba::black(), -1.0).to_rgba8().a, 0);
    }

    #[test]
    fn test_background_rect_centered() {
        let rect = background_rect(Size::new(800.0, 600.0), 400.0, 200.0);
        assert_eq!(rect, Rect::new(200.0, 200.0, 600.0, 400.0));

        // Larger than the viewport: hangs off both edges symmetrically
        let rect = background_rect(Size::new(800.0, 600.0), 1000.0, 600.0);
        assert_eq!(rect.x0, -100.0);
        assert_eq!(rect.x1, 900.0);
    }

    #[test]
    fn test_label_font_size_scales_with_grid() {
        assert_eq!(label_font_size(40.0), 14.0);
        assert_eq!(label_font_size(10.0), 12.0); // clamped low
        assert_eq!(label_font_size(80.0), 24.0); // clamped high
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(decode_data_url("not base64 at all!!!").is_none());
        // Valid base64, not an image
        assert!(decode_data_url("aGVsbG8gd29ybGQ=").is_none());
    }

    #[test]
    fn test_decode_strips_data_url_prefix() {
        // Prefix handling alone; payload is valid base64 but not an image,
        // so decoding stops at the image stage rather than the b64 stage.
        assert!(decode_data_url("data:image/png;base64,aGVsbG8=").is_none());
    }

    #[test]
    fn test_build_scene_with_entities() {
        let session = populated_session();
        let mut renderer = MapRenderer::new();
        let ctx = RenderContext::new(&session, Size::new(800.0, 600.0));
        renderer.build_scene(&ctx);
    }

    #[test]
    fn test_build_scene_with_active_gestures() {
        let mut session = populated_session();
        session.pointer_down(Point::new(300.0, 300.0), Modifiers::NONE);
        session.pointer_move(Point::new(340.0, 340.0));
        assert!(session.is_gesture_active());

        let mut renderer = MapRenderer::new();
        let ctx = RenderContext::new(&session, Size::new(800.0, 600.0));
        renderer.build_scene(&ctx);
    }

    #[test]
    fn test_build_scene_with_scale_factor() {
        let session = populated_session();
        let mut renderer = MapRenderer::new();
        let ctx = RenderContext::new(&session, Size::new(800.0, 600.0)).with_scale_factor(2.0);
        assert_eq!(ctx.scale_factor, 2.0);
        renderer.build_scene(&ctx);
    }

    #[test]
    fn test_build_scene_with_bad_background() {
        let mut session = Session::new();
        session.set_background_image(Some("data:image/png;base64,%%%".to_string()));

        let mut renderer = MapRenderer::new();
        let ctx = RenderContext::new(&session, Size::new(800.0, 600.0));
        // Decode failure must not block the rest of the frame.
        renderer.build_scene(&ctx);
        renderer.build_scene(&ctx); // cached failure path
    }
}
