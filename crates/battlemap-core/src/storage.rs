//! Session-file serialization: save and restore the whole map state.

use crate::document::MapDocument;
use crate::entities::{BrushStroke, Token, VisionBlock};
use crate::session::Session;
use kurbo::Vec2;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Save-format version this build reads and writes.
pub const SAVE_VERSION: &str = "1.0";

/// Errors from session-file operations.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Unsupported save version: {0:?}")]
    UnsupportedVersion(String),
}

/// View settings block of the save file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewSettings {
    #[serde(rename = "gridSize")]
    pub grid_size: f64,
    pub zoom: f64,
    #[serde(rename = "panOffset")]
    pub pan_offset: Vec2,
}

/// The on-disk session file.
///
/// Field names are part of the external contract; saved maps must stay
/// loadable by other tooling that reads the same format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionFile {
    pub version: String,
    /// ISO-8601 creation time of the save.
    pub timestamp: String,
    #[serde(rename = "backgroundImage")]
    pub background_image: Option<String>,
    pub settings: ViewSettings,
    pub tokens: Vec<Token>,
    pub drawings: Vec<BrushStroke>,
    #[serde(rename = "visionBlocks")]
    pub vision_blocks: Vec<VisionBlock>,
}

impl SessionFile {
    /// Snapshot the current session state into a save file.
    pub fn capture(session: &Session) -> Self {
        Self {
            version: SAVE_VERSION.to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            background_image: session.background_image.clone(),
            settings: ViewSettings {
                grid_size: session.grid_size(),
                zoom: session.camera.zoom,
                pan_offset: session.camera.offset,
            },
            tokens: session.document.tokens.clone(),
            drawings: session.document.drawings.clone(),
            vision_blocks: session.document.vision_blocks.clone(),
        }
    }

    pub fn to_json(&self) -> Result<String, StorageError> {
        serde_json::to_string_pretty(self).map_err(|e| StorageError::Serialization(e.to_string()))
    }

    pub fn from_json(json: &str) -> Result<Self, StorageError> {
        serde_json::from_str(json).map_err(|e| StorageError::Serialization(e.to_string()))
    }

    pub fn save_to_file(&self, path: &Path) -> Result<(), StorageError> {
        let json = self.to_json()?;
        std::fs::write(path, json).map_err(|e| StorageError::Io(e.to_string()))
    }

    pub fn load_from_file(path: &Path) -> Result<Self, StorageError> {
        let json = std::fs::read_to_string(path).map_err(|e| StorageError::Io(e.to_string()))?;
        Self::from_json(&json)
    }
}

impl Session {
    /// Capture the session into a save file.
    pub fn save(&self) -> SessionFile {
        SessionFile::capture(self)
    }

    /// Replace the session state with a loaded save file.
    ///
    /// The version is validated first; on any error the session is left
    /// untouched. On success every collection is replaced wholesale
    /// (empty arrays included), numeric settings are clamped into range,
    /// selection and gesture state are dropped, and history restarts from
    /// the loaded document.
    pub fn load(&mut self, file: SessionFile) -> Result<(), StorageError> {
        if file.version != SAVE_VERSION {
            return Err(StorageError::UnsupportedVersion(file.version));
        }

        self.background_image = file.background_image;
        self.set_grid_size(file.settings.grid_size);
        self.camera.set_zoom(file.settings.zoom);
        self.camera.offset = file.settings.pan_offset;

        self.document = MapDocument {
            tokens: file.tokens,
            drawings: file.drawings,
            vision_blocks: file.vision_blocks,
        };
        // Saved sizes may disagree with the clamped grid size; token
        // diameter is always grid size times class multiplier.
        self.document.rescale_tokens(self.grid_size());
        self.cancel();
        self.history.reset(&self.document);
        log::info!(
            "loaded session: {} tokens, {} drawings, {} vision blocks (saved {})",
            self.document.tokens.len(),
            self.document.drawings.len(),
            self.document.vision_blocks.len(),
            file.timestamp,
        );
        Ok(())
    }
}
