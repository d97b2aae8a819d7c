//! Battlemap Core Library
//!
//! Platform-agnostic interaction engine for the battle-map canvas: camera
//! transforms, entities, hit testing, the interaction mode state machine,
//! bounded undo history, and session-file serialization.

pub mod camera;
pub mod document;
pub mod entities;
pub mod history;
pub mod input;
pub mod session;
pub mod snap;
pub mod storage;

pub use camera::{Camera, MAX_ZOOM, MIN_ZOOM};
pub use document::MapDocument;
pub use entities::{
    point_in_polygon, BrushStroke, EntityId, FreehandBlock, RectBlock, Rgba, SizeClass, Token,
    VisionBlock,
};
pub use history::{HistoryStack, MAX_HISTORY};
pub use input::{KeyAction, Modifiers};
pub use session::{BlockPreview, CursorHint, Mode, Session, VisionTool};
pub use snap::{clamp_grid_size, snap_to_grid, DEFAULT_GRID_SIZE, GRID_MAX, GRID_MIN};
pub use storage::{SessionFile, StorageError, SAVE_VERSION};
