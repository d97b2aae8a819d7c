//! Interaction session: the mode state machine and map aggregate.
//!
//! The session owns the document, camera, selection, and history. All
//! mutation flows through the pointer and keyboard handlers; a history
//! snapshot is pushed only when a gesture commits.

use crate::camera::Camera;
use crate::document::MapDocument;
use crate::entities::{
    BrushStroke, EntityId, FreehandBlock, RectBlock, Rgba, SizeClass, Token, VisionBlock,
};
use crate::history::HistoryStack;
use crate::input::{KeyAction, Modifiers};
use crate::snap::{clamp_grid_size, snap_to_grid, DEFAULT_GRID_SIZE};
use kurbo::{Point, Size, Vec2};
use std::collections::HashSet;

/// Interaction mode. Transitions happen only through [`Session::set_mode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Idle,
    Drawing,
    PlacingToken,
    VisionBlocking,
}

/// Active sub-tool while vision blocking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VisionTool {
    #[default]
    Rect,
    Freehand,
}

/// Cursor shape hint for the host UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorHint {
    Grab,
    Grabbing,
    Crosshair,
}

/// In-progress gesture scratch state. At most one exists at a time, so a
/// pan can never overlap a drag and a stroke can never overlap a block.
#[derive(Debug, Clone)]
enum Gesture {
    /// Panning the view; `last` is the previous screen position.
    Pan { last: Point },
    /// Dragging a token; `offset` keeps the grab point stable under the
    /// cursor. `moved` gates the commit so a plain click records nothing.
    DragToken {
        id: EntityId,
        offset: Vec2,
        moved: bool,
    },
    /// Drawing an ink stroke.
    Stroke(BrushStroke),
    /// Dragging out a rectangular vision block.
    RectBlock(RectBlock),
    /// Tracing a freehand vision block.
    FreehandBlock(FreehandBlock),
}

/// Brush settings for the drawing mode.
#[derive(Debug, Clone)]
pub struct BrushSettings {
    pub color: Rgba,
    pub width: f64,
    pub opacity: f64,
}

impl Default for BrushSettings {
    fn default() -> Self {
        Self {
            color: Rgba::red(),
            width: 5.0,
            opacity: 0.5,
        }
    }
}

/// Settings for the vision-blocking mode.
#[derive(Debug, Clone)]
pub struct BlockSettings {
    pub color: Rgba,
    pub opacity: f64,
    pub snap_to_grid: bool,
    pub tool: VisionTool,
}

impl Default for BlockSettings {
    fn default() -> Self {
        Self {
            color: Rgba::black(),
            opacity: 0.8,
            snap_to_grid: true,
            tool: VisionTool::Rect,
        }
    }
}

/// Pending-token settings for the placement mode.
#[derive(Debug, Clone)]
pub struct TokenSettings {
    pub color: Rgba,
    pub label: String,
    pub size_class: SizeClass,
}

impl Default for TokenSettings {
    fn default() -> Self {
        Self {
            color: Rgba::red(),
            label: String::new(),
            size_class: SizeClass::Normal,
        }
    }
}

/// A borrowed view of the in-progress vision block, for previews.
#[derive(Debug, Clone, Copy)]
pub enum BlockPreview<'a> {
    Rect(&'a RectBlock),
    Freehand(&'a FreehandBlock),
}

/// The map session: single owner of all interactive state.
#[derive(Debug, Clone)]
pub struct Session {
    pub document: MapDocument,
    pub camera: Camera,
    pub(crate) mode: Mode,
    gesture: Option<Gesture>,
    /// Selected vision blocks; ids always refer to live document entries.
    pub selected_blocks: HashSet<EntityId>,
    pub selected_token: Option<EntityId>,
    pub(crate) history: HistoryStack,
    pub(crate) grid_size: f64,
    pub show_grid: bool,
    /// Encoded background image data, if a map is loaded.
    pub background_image: Option<String>,
    pub brush: BrushSettings,
    pub block: BlockSettings,
    pub token: TokenSettings,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        let document = MapDocument::new();
        let mut history = HistoryStack::new();
        history.reset(&document);

        Self {
            document,
            camera: Camera::new(),
            mode: Mode::Idle,
            gesture: None,
            selected_blocks: HashSet::new(),
            selected_token: None,
            history,
            grid_size: DEFAULT_GRID_SIZE,
            show_grid: true,
            background_image: None,
            brush: BrushSettings::default(),
            block: BlockSettings::default(),
            token: TokenSettings::default(),
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Switch interaction mode, discarding any in-progress gesture and the
    /// previous mode's selection.
    pub fn set_mode(&mut self, mode: Mode) {
        if mode == self.mode {
            return;
        }
        log::debug!("mode change {:?} -> {:?}", self.mode, mode);
        self.gesture = None;
        self.selected_blocks.clear();
        self.selected_token = None;
        self.mode = mode;
    }

    pub fn grid_size(&self) -> f64 {
        self.grid_size
    }

    /// Set the grid size (clamped) and rescale all tokens to match.
    pub fn set_grid_size(&mut self, size: f64) {
        self.grid_size = clamp_grid_size(size);
        self.document.rescale_tokens(self.grid_size);
    }

    pub fn set_viewport(&mut self, size: Size) {
        self.camera.set_viewport(size);
    }

    /// Load (or clear) the background map image, resetting the view.
    pub fn set_background_image(&mut self, image: Option<String>) {
        self.background_image = image;
        self.camera.reset();
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn is_gesture_active(&self) -> bool {
        self.gesture.is_some()
    }

    /// In-progress stroke, for the preview layer.
    pub fn current_stroke(&self) -> Option<&BrushStroke> {
        match &self.gesture {
            Some(Gesture::Stroke(stroke)) => Some(stroke),
            _ => None,
        }
    }

    /// In-progress vision block, for the preview layer.
    pub fn current_block(&self) -> Option<BlockPreview<'_>> {
        match &self.gesture {
            Some(Gesture::RectBlock(block)) => Some(BlockPreview::Rect(block)),
            Some(Gesture::FreehandBlock(block)) => Some(BlockPreview::Freehand(block)),
            _ => None,
        }
    }

    pub fn is_block_selected(&self, id: EntityId) -> bool {
        self.selected_blocks.contains(&id)
    }

    pub fn is_token_selected(&self, id: EntityId) -> bool {
        self.selected_token == Some(id)
    }

    /// Cursor shape the host should show right now.
    pub fn cursor_hint(&self) -> CursorHint {
        match (self.mode, &self.gesture) {
            (Mode::Idle, Some(Gesture::Pan { .. })) => CursorHint::Grabbing,
            (Mode::Idle, Some(Gesture::DragToken { .. })) => CursorHint::Crosshair,
            (Mode::Idle, _) => CursorHint::Grab,
            _ => CursorHint::Crosshair,
        }
    }

    /// Wheel zoom, active only while idle.
    pub fn wheel(&mut self, screen: Point, scroll_y: f64) {
        if self.mode != Mode::Idle {
            return;
        }
        self.camera.wheel_zoom(screen, scroll_y);
    }

    pub fn pointer_down(&mut self, screen: Point, modifiers: Modifiers) {
        if self.gesture.is_some() {
            return;
        }
        let world = self.camera.screen_to_world(screen);

        match self.mode {
            Mode::Idle => self.idle_down(screen, world),
            Mode::Drawing => {
                self.gesture = Some(Gesture::Stroke(BrushStroke::start(
                    world,
                    self.brush.color,
                    self.brush.width,
                    self.brush.opacity,
                )));
            }
            Mode::PlacingToken => self.placing_down(world),
            Mode::VisionBlocking => self.vision_down(world, modifiers),
        }
    }

    fn idle_down(&mut self, screen: Point, world: Point) {
        if let Some(id) = self.document.token_at(world) {
            self.selected_token = Some(id);
            if let Some(token) = self.document.token(id) {
                let offset = Vec2::new(world.x - token.x, world.y - token.y);
                self.gesture = Some(Gesture::DragToken {
                    id,
                    offset,
                    moved: false,
                });
            }
        } else {
            self.selected_token = None;
            self.gesture = Some(Gesture::Pan { last: screen });
        }
    }

    fn placing_down(&mut self, world: Point) {
        // Existing tokens can still be grabbed and dragged in this mode.
        if let Some(id) = self.document.token_at(world) {
            self.selected_token = Some(id);
            if let Some(token) = self.document.token(id) {
                let offset = Vec2::new(world.x - token.x, world.y - token.y);
                self.gesture = Some(Gesture::DragToken {
                    id,
                    offset,
                    moved: false,
                });
            }
            return;
        }

        let label = self.token.label.trim();
        if label.is_empty() {
            self.selected_token = None;
            return;
        }

        let token = Token::new(
            world,
            self.token.color,
            label.to_string(),
            self.grid_size,
            self.token.size_class,
        );
        log::debug!("placed token {:?} at {:?}", token.label, world);
        self.selected_token = Some(token.id);
        self.document.add_token(token);
        self.commit();
    }

    fn vision_down(&mut self, world: Point, modifiers: Modifiers) {
        match self.block.tool {
            VisionTool::Rect => {
                if let Some(id) = self.document.vision_block_at(world) {
                    if modifiers.command() {
                        // Additive toggle
                        if !self.selected_blocks.remove(&id) {
                            self.selected_blocks.insert(id);
                        }
                    } else {
                        self.selected_blocks.clear();
                        self.selected_blocks.insert(id);
                    }
                    return;
                }

                if !modifiers.command() {
                    self.selected_blocks.clear();
                }
                let start = self.maybe_snap(world);
                self.gesture = Some(Gesture::RectBlock(RectBlock::start(
                    start,
                    self.block.color,
                    self.block.opacity,
                )));
            }
            VisionTool::Freehand => {
                self.gesture = Some(Gesture::FreehandBlock(FreehandBlock::start(
                    world,
                    self.block.color,
                    self.block.opacity,
                )));
            }
        }
    }

    pub fn pointer_move(&mut self, screen: Point) {
        let world = self.camera.screen_to_world(screen);
        let snap = self.block.snap_to_grid;
        let grid = self.grid_size;

        match self.gesture.as_mut() {
            None => {}
            Some(Gesture::Pan { last }) => {
                let delta = Vec2::new(screen.x - last.x, screen.y - last.y);
                *last = screen;
                self.camera.pan(delta);
            }
            Some(Gesture::DragToken { id, offset, moved }) => {
                let target = Point::new(world.x - offset.x, world.y - offset.y);
                let id = *id;
                *moved = true;
                if let Some(token) = self.document.token_mut(id) {
                    // Free movement: dragging never grid-snaps.
                    token.set_position(target);
                }
            }
            Some(Gesture::Stroke(stroke)) => stroke.add_point(world),
            Some(Gesture::RectBlock(block)) => {
                let corner = if snap { snap_to_grid(world, grid) } else { world };
                block.drag_to(corner);
            }
            Some(Gesture::FreehandBlock(block)) => block.add_point(world),
        }
    }

    /// Finish the in-progress gesture. A pointer-up with no matching down
    /// is a no-op.
    pub fn pointer_up(&mut self) {
        let Some(gesture) = self.gesture.take() else {
            return;
        };

        match gesture {
            Gesture::Pan { .. } => {}
            Gesture::DragToken { moved, .. } => {
                if moved {
                    self.commit();
                }
            }
            Gesture::Stroke(stroke) => {
                if stroke.is_committable() {
                    self.document.add_drawing(stroke);
                    self.commit();
                } else {
                    log::debug!("discarding single-point stroke");
                }
            }
            Gesture::RectBlock(block) => {
                if block.is_committable() {
                    self.document.add_vision_block(VisionBlock::Rect(block));
                    self.commit();
                } else {
                    log::debug!("discarding degenerate vision rect");
                }
            }
            Gesture::FreehandBlock(block) => {
                if block.is_committable() {
                    self.document.add_vision_block(VisionBlock::Freehand(block));
                    self.commit();
                } else {
                    log::debug!("discarding degenerate freehand block");
                }
            }
        }
    }

    /// The pointer left the canvas: same contract as pointer-up.
    pub fn pointer_leave(&mut self) {
        self.pointer_up();
    }

    /// Dispatch a raw key event. Returns whether it was handled.
    pub fn handle_key(&mut self, key: &str, modifiers: Modifiers) -> bool {
        let Some(action) = KeyAction::from_key(key, modifiers) else {
            return false;
        };
        self.apply(action);
        true
    }

    pub fn apply(&mut self, action: KeyAction) {
        match action {
            KeyAction::Undo => self.undo(),
            KeyAction::Redo => self.redo(),
            KeyAction::DeleteSelection => self.delete_selection(),
            KeyAction::Cancel => self.cancel(),
            KeyAction::SelectAll => self.select_all_blocks(),
        }
    }

    pub fn undo(&mut self) {
        if let Some(document) = self.history.undo() {
            self.document = document;
            self.prune_selection();
        }
    }

    pub fn redo(&mut self) {
        if let Some(document) = self.history.redo() {
            self.document = document;
            self.prune_selection();
        }
    }

    /// Delete whatever the current mode considers selected.
    pub fn delete_selection(&mut self) {
        match self.mode {
            Mode::VisionBlocking => {
                let removed = self.document.remove_vision_blocks(&self.selected_blocks);
                self.selected_blocks.clear();
                if removed > 0 {
                    log::debug!("deleted {removed} vision blocks");
                    self.commit();
                }
            }
            Mode::Idle | Mode::PlacingToken => {
                if let Some(id) = self.selected_token.take() {
                    if self.document.remove_token(id) {
                        self.commit();
                    }
                }
            }
            Mode::Drawing => {}
        }
    }

    /// Remove every token from the map.
    pub fn clear_tokens(&mut self) {
        if self.document.tokens.is_empty() {
            return;
        }
        self.document.clear_tokens();
        self.selected_token = None;
        self.commit();
    }

    /// Remove every ink stroke from the map.
    pub fn clear_drawings(&mut self) {
        if self.document.drawings.is_empty() {
            return;
        }
        self.document.clear_drawings();
        self.commit();
    }

    /// Remove every vision block from the map.
    pub fn clear_vision_blocks(&mut self) {
        if self.document.vision_blocks.is_empty() {
            return;
        }
        self.document.clear_vision_blocks();
        self.selected_blocks.clear();
        self.commit();
    }

    /// Abandon the in-progress gesture and clear selection. Never touches
    /// the document or history.
    pub fn cancel(&mut self) {
        self.gesture = None;
        self.selected_blocks.clear();
        self.selected_token = None;
    }

    /// Select every vision block (VisionBlocking mode only).
    pub fn select_all_blocks(&mut self) {
        if self.mode != Mode::VisionBlocking {
            return;
        }
        self.selected_blocks = self.document.vision_blocks.iter().map(|b| b.id()).collect();
    }

    fn maybe_snap(&self, world: Point) -> Point {
        if self.block.snap_to_grid {
            snap_to_grid(world, self.grid_size)
        } else {
            world
        }
    }

    fn commit(&mut self) {
        self.history.record(&self.document);
    }

    /// Drop selection entries that no longer refer to live entities.
    pub(crate) fn prune_selection(&mut self) {
        let doc = &self.document;
        self.selected_blocks
            .retain(|id| doc.vision_block(*id).is_some());
        if let Some(id) = self.selected_token {
            if doc.token(id).is_none() {
                self.selected_token = None;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Session with an identity view: zoom 1, no pan, so screen == world.
    fn session() -> Session {
        let mut session = Session::new();
        session.camera.center = Point::ZERO;
        session
    }

    fn drag(session: &mut Session, from: Point, via: &[Point]) {
        session.pointer_down(from, Modifiers::NONE);
        for p in via {
            session.pointer_move(*p);
        }
        session.pointer_up();
    }

    #[test]
    fn test_place_and_drag_token() {
        let mut s = session();
        s.set_mode(Mode::PlacingToken);
        s.token.label = "Hero".to_string();

        s.pointer_down(Point::new(100.0, 100.0), Modifiers::NONE);
        s.pointer_up();
        assert_eq!(s.document.tokens.len(), 1);
        assert!((s.document.tokens[0].size - 36.0).abs() < f64::EPSILON);
        assert_eq!(s.history_len(), 2); // baseline + placement

        // Drag it: several moves, exactly one extra snapshot.
        drag(
            &mut s,
            Point::new(100.0, 100.0),
            &[
                Point::new(120.0, 110.0),
                Point::new(140.0, 115.0),
                Point::new(150.0, 120.0),
            ],
        );
        assert!((s.document.tokens[0].x - 150.0).abs() < f64::EPSILON);
        assert!((s.document.tokens[0].y - 120.0).abs() < f64::EPSILON);
        assert_eq!(s.history_len(), 3);
    }

    #[test]
    fn test_empty_label_places_nothing() {
        let mut s = session();
        s.set_mode(Mode::PlacingToken);
        s.token.label = "   ".to_string();

        s.pointer_down(Point::new(100.0, 100.0), Modifiers::NONE);
        s.pointer_up();
        assert!(s.document.tokens.is_empty());
        assert_eq!(s.history_len(), 1);
    }

    #[test]
    fn test_click_without_drag_records_nothing() {
        let mut s = session();
        s.set_mode(Mode::PlacingToken);
        s.token.label = "Hero".to_string();
        s.pointer_down(Point::new(100.0, 100.0), Modifiers::NONE);
        s.pointer_up();

        // Click the token without moving: selected, but no new snapshot.
        s.pointer_down(Point::new(100.0, 100.0), Modifiers::NONE);
        s.pointer_up();
        assert!(s.selected_token.is_some());
        assert_eq!(s.history_len(), 2);
    }

    #[test]
    fn test_single_point_stroke_discarded() {
        let mut s = session();
        s.set_mode(Mode::Drawing);
        s.pointer_down(Point::new(50.0, 50.0), Modifiers::NONE);
        s.pointer_up();

        assert!(s.document.drawings.is_empty());
        assert_eq!(s.history_len(), 1);
    }

    #[test]
    fn test_stroke_commit() {
        let mut s = session();
        s.set_mode(Mode::Drawing);
        drag(
            &mut s,
            Point::new(50.0, 50.0),
            &[Point::new(60.0, 55.0), Point::new(70.0, 60.0)],
        );

        assert_eq!(s.document.drawings.len(), 1);
        assert_eq!(s.document.drawings[0].points.len(), 3);
        assert_eq!(s.history_len(), 2);
    }

    #[test]
    fn test_snapped_rect_block() {
        let mut s = session();
        s.set_mode(Mode::VisionBlocking);
        drag(&mut s, Point::new(5.0, 5.0), &[Point::new(83.0, 77.0)]);

        assert_eq!(s.document.vision_blocks.len(), 1);
        match &s.document.vision_blocks[0] {
            VisionBlock::Rect(block) => {
                assert!((block.start_x).abs() < f64::EPSILON);
                assert!((block.start_y).abs() < f64::EPSILON);
                assert!((block.end_x - 80.0).abs() < f64::EPSILON);
                assert!((block.end_y - 80.0).abs() < f64::EPSILON);
            }
            other => panic!("expected rect block, got {other:?}"),
        }
    }

    #[test]
    fn test_degenerate_rect_discarded() {
        let mut s = session();
        s.set_mode(Mode::VisionBlocking);
        s.block.snap_to_grid = false;
        drag(&mut s, Point::new(0.0, 0.0), &[Point::new(3.0, 100.0)]);

        assert!(s.document.vision_blocks.is_empty());
        assert_eq!(s.history_len(), 1);
    }

    #[test]
    fn test_freehand_block_thresholds() {
        let mut s = session();
        s.set_mode(Mode::VisionBlocking);
        s.block.tool = VisionTool::Freehand;

        // Two points: discarded.
        drag(&mut s, Point::new(0.0, 0.0), &[Point::new(10.0, 0.0)]);
        assert!(s.document.vision_blocks.is_empty());

        // Three points: committed.
        drag(
            &mut s,
            Point::new(0.0, 0.0),
            &[Point::new(10.0, 0.0), Point::new(10.0, 10.0)],
        );
        assert_eq!(s.document.vision_blocks.len(), 1);
        assert_eq!(s.history_len(), 2);
    }

    #[test]
    fn test_block_selection() {
        let mut s = session();
        s.set_mode(Mode::VisionBlocking);
        s.block.snap_to_grid = false;
        drag(&mut s, Point::new(0.0, 0.0), &[Point::new(100.0, 100.0)]);
        // Start outside the first block so a new drag begins instead of a select
        drag(&mut s, Point::new(150.0, 150.0), &[Point::new(50.0, 50.0)]);
        let top_id = s.document.vision_blocks[1].id();
        let bottom_id = s.document.vision_blocks[0].id();

        // Plain click in the overlap: topmost becomes the sole selection.
        s.pointer_down(Point::new(75.0, 75.0), Modifiers::NONE);
        s.pointer_up();
        assert_eq!(s.selected_blocks.len(), 1);
        assert!(s.is_block_selected(top_id));

        // Ctrl-click the other block: additive.
        let ctrl = Modifiers {
            ctrl: true,
            ..Modifiers::NONE
        };
        s.pointer_down(Point::new(10.0, 10.0), ctrl);
        s.pointer_up();
        assert_eq!(s.selected_blocks.len(), 2);

        // Ctrl-click a selected block: toggles it off.
        s.pointer_down(Point::new(10.0, 10.0), ctrl);
        s.pointer_up();
        assert_eq!(s.selected_blocks.len(), 1);
        assert!(!s.is_block_selected(bottom_id));
    }

    #[test]
    fn test_delete_selected_blocks() {
        let mut s = session();
        s.set_mode(Mode::VisionBlocking);
        s.block.snap_to_grid = false;
        drag(&mut s, Point::new(0.0, 0.0), &[Point::new(50.0, 50.0)]);
        drag(&mut s, Point::new(100.0, 0.0), &[Point::new(150.0, 50.0)]);

        s.handle_key("a", Modifiers { ctrl: true, ..Modifiers::NONE });
        assert_eq!(s.selected_blocks.len(), 2);

        s.handle_key("Delete", Modifiers::NONE);
        assert!(s.document.vision_blocks.is_empty());
        assert!(s.selected_blocks.is_empty());
        assert_eq!(s.history_len(), 4); // baseline + 2 blocks + delete

        // Deleting nothing records nothing.
        s.handle_key("Delete", Modifiers::NONE);
        assert_eq!(s.history_len(), 4);
    }

    #[test]
    fn test_delete_is_mode_scoped() {
        let mut s = session();
        s.set_mode(Mode::PlacingToken);
        s.token.label = "Hero".to_string();
        s.pointer_down(Point::new(100.0, 100.0), Modifiers::NONE);
        s.pointer_up();

        // Reselect in Idle, where token deletion applies.
        let id = s.selected_token.unwrap();
        s.set_mode(Mode::Idle);
        s.pointer_down(Point::new(100.0, 100.0), Modifiers::NONE);
        s.pointer_up();
        assert_eq!(s.selected_token, Some(id));

        s.handle_key("Delete", Modifiers::NONE);
        assert!(s.document.tokens.is_empty());
    }

    #[test]
    fn test_escape_cancels_gesture() {
        let mut s = session();
        s.set_mode(Mode::Drawing);
        s.pointer_down(Point::new(0.0, 0.0), Modifiers::NONE);
        s.pointer_move(Point::new(50.0, 50.0));

        s.handle_key("Escape", Modifiers::NONE);
        assert!(!s.is_gesture_active());

        // The up that follows the abandoned gesture is a no-op.
        s.pointer_up();
        assert!(s.document.drawings.is_empty());
        assert_eq!(s.history_len(), 1);
    }

    #[test]
    fn test_stray_events_are_noops() {
        let mut s = session();
        s.pointer_move(Point::new(10.0, 10.0));
        s.pointer_up();
        s.pointer_leave();
        assert!(s.document.is_empty());
        assert_eq!(s.history_len(), 1);
    }

    #[test]
    fn test_undo_redo_full_cycle() {
        let mut s = session();
        s.set_mode(Mode::Drawing);
        for i in 0..3 {
            let x = i as f64 * 100.0;
            drag(
                &mut s,
                Point::new(x, 0.0),
                &[Point::new(x + 10.0, 10.0), Point::new(x + 20.0, 0.0)],
            );
        }
        assert_eq!(s.document.drawings.len(), 3);

        let ctrl = Modifiers { ctrl: true, ..Modifiers::NONE };
        for _ in 0..3 {
            s.handle_key("z", ctrl);
        }
        assert!(s.document.is_empty());

        for _ in 0..3 {
            s.handle_key("y", ctrl);
        }
        assert_eq!(s.document.drawings.len(), 3);
    }

    #[test]
    fn test_undo_prunes_selection() {
        let mut s = session();
        s.set_mode(Mode::VisionBlocking);
        s.block.snap_to_grid = false;
        drag(&mut s, Point::new(0.0, 0.0), &[Point::new(50.0, 50.0)]);
        s.pointer_down(Point::new(25.0, 25.0), Modifiers::NONE);
        s.pointer_up();
        assert_eq!(s.selected_blocks.len(), 1);

        s.undo();
        assert!(s.document.vision_blocks.is_empty());
        assert!(s.selected_blocks.is_empty());
    }

    #[test]
    fn test_mode_change_clears_state() {
        let mut s = session();
        s.set_mode(Mode::Drawing);
        s.pointer_down(Point::new(0.0, 0.0), Modifiers::NONE);
        assert!(s.is_gesture_active());

        s.set_mode(Mode::VisionBlocking);
        assert!(!s.is_gesture_active());
        assert!(s.selected_blocks.is_empty());
        assert!(s.selected_token.is_none());
    }

    #[test]
    fn test_wheel_only_zooms_while_idle() {
        let mut s = session();
        s.wheel(Point::new(100.0, 100.0), -1.0);
        assert!((s.camera.zoom - 1.1).abs() < f64::EPSILON);

        s.set_mode(Mode::Drawing);
        s.wheel(Point::new(100.0, 100.0), -1.0);
        assert!((s.camera.zoom - 1.1).abs() < f64::EPSILON);
    }

    #[test]
    fn test_pan_in_idle() {
        let mut s = session();
        s.pointer_down(Point::new(100.0, 100.0), Modifiers::NONE);
        s.pointer_move(Point::new(130.0, 90.0));
        s.pointer_move(Point::new(140.0, 80.0));
        s.pointer_up();

        assert!((s.camera.offset.x - 40.0).abs() < f64::EPSILON);
        assert!((s.camera.offset.y + 20.0).abs() < f64::EPSILON);
        // Pans never touch history.
        assert_eq!(s.history_len(), 1);
    }

    #[test]
    fn test_pointer_accounts_for_camera() {
        let mut s = session();
        s.camera.center = Point::new(400.0, 300.0);
        s.camera.zoom = 2.0;
        s.set_mode(Mode::PlacingToken);
        s.token.label = "Hero".to_string();

        let screen = Point::new(500.0, 340.0);
        let expected = s.camera.screen_to_world(screen);
        s.pointer_down(screen, Modifiers::NONE);
        s.pointer_up();

        assert!((s.document.tokens[0].x - expected.x).abs() < 1e-9);
        assert!((s.document.tokens[0].y - expected.y).abs() < 1e-9);
    }

    #[test]
    fn test_select_all_scoped_to_vision_mode() {
        let mut s = session();
        s.set_mode(Mode::VisionBlocking);
        s.block.snap_to_grid = false;
        drag(&mut s, Point::new(0.0, 0.0), &[Point::new(50.0, 50.0)]);

        s.set_mode(Mode::Idle);
        s.select_all_blocks();
        assert!(s.selected_blocks.is_empty());
    }

    #[test]
    fn test_grid_size_change_rescales_tokens() {
        let mut s = session();
        s.set_mode(Mode::PlacingToken);
        s.token.label = "Hero".to_string();
        s.pointer_down(Point::new(100.0, 100.0), Modifiers::NONE);
        s.pointer_up();

        s.set_grid_size(200.0); // clamped to 80
        assert!((s.grid_size() - 80.0).abs() < f64::EPSILON);
        assert!((s.document.tokens[0].size - 72.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_new_background_resets_camera() {
        let mut s = session();
        s.camera.pan(Vec2::new(40.0, 40.0));
        s.camera.set_zoom(3.0);
        s.set_background_image(Some("data:image/png;base64,AAAA".to_string()));

        assert_eq!(s.camera.offset, Vec2::ZERO);
        assert!((s.camera.zoom - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_clear_operations_are_undoable() {
        let mut s = session();
        s.set_mode(Mode::PlacingToken);
        s.token.label = "Hero".to_string();
        s.pointer_down(Point::new(100.0, 100.0), Modifiers::NONE);
        s.pointer_up();

        s.clear_tokens();
        assert!(s.document.tokens.is_empty());
        s.undo();
        assert_eq!(s.document.tokens.len(), 1);

        // Clearing an empty collection records nothing.
        let len = s.history_len();
        s.clear_drawings();
        assert_eq!(s.history_len(), len);
    }

    #[test]
    fn test_cursor_hints() {
        let mut s = session();
        assert_eq!(s.cursor_hint(), CursorHint::Grab);
        s.pointer_down(Point::new(0.0, 0.0), Modifiers::NONE);
        assert_eq!(s.cursor_hint(), CursorHint::Grabbing);
        s.pointer_up();

        s.set_mode(Mode::Drawing);
        assert_eq!(s.cursor_hint(), CursorHint::Crosshair);
    }
}
