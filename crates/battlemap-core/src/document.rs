//! Map document: the committed entity collections.

use crate::entities::{BrushStroke, EntityId, Token, VisionBlock};
use kurbo::Point;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// The committed state of a map: tokens, ink strokes, and vision blocks.
///
/// Insertion order doubles as z-order (back to front). Hit queries walk
/// the collections in reverse so the most recently added entity wins.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MapDocument {
    pub tokens: Vec<Token>,
    pub drawings: Vec<BrushStroke>,
    #[serde(rename = "visionBlocks")]
    pub vision_blocks: Vec<VisionBlock>,
}

impl MapDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_token(&mut self, token: Token) {
        self.tokens.push(token);
    }

    pub fn token(&self, id: EntityId) -> Option<&Token> {
        self.tokens.iter().find(|t| t.id == id)
    }

    pub fn token_mut(&mut self, id: EntityId) -> Option<&mut Token> {
        self.tokens.iter_mut().find(|t| t.id == id)
    }

    /// Remove a token by id. Returns whether anything was removed.
    pub fn remove_token(&mut self, id: EntityId) -> bool {
        let before = self.tokens.len();
        self.tokens.retain(|t| t.id != id);
        self.tokens.len() != before
    }

    /// Topmost token containing the given world point.
    pub fn token_at(&self, point: Point) -> Option<EntityId> {
        self.tokens
            .iter()
            .rev()
            .find(|t| t.hit_test(point))
            .map(|t| t.id)
    }

    pub fn add_drawing(&mut self, stroke: BrushStroke) {
        self.drawings.push(stroke);
    }

    pub fn add_vision_block(&mut self, block: VisionBlock) {
        self.vision_blocks.push(block);
    }

    pub fn vision_block(&self, id: EntityId) -> Option<&VisionBlock> {
        self.vision_blocks.iter().find(|b| b.id() == id)
    }

    /// Topmost vision block containing the given world point.
    pub fn vision_block_at(&self, point: Point) -> Option<EntityId> {
        self.vision_blocks
            .iter()
            .rev()
            .find(|b| b.hit_test(point))
            .map(|b| b.id())
    }

    /// Remove all vision blocks in the id set. Returns the removed count.
    pub fn remove_vision_blocks(&mut self, ids: &HashSet<EntityId>) -> usize {
        let before = self.vision_blocks.len();
        self.vision_blocks.retain(|b| !ids.contains(&b.id()));
        before - self.vision_blocks.len()
    }

    /// Recompute every token's diameter for a new grid size.
    pub fn rescale_tokens(&mut self, grid_size: f64) {
        for token in &mut self.tokens {
            token.rescale(grid_size);
        }
    }

    pub fn clear_tokens(&mut self) {
        self.tokens.clear();
    }

    pub fn clear_drawings(&mut self) {
        self.drawings.clear();
    }

    pub fn clear_vision_blocks(&mut self) {
        self.vision_blocks.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty() && self.drawings.is_empty() && self.vision_blocks.is_empty()
    }
}
