//! Bounded undo/redo history over map document snapshots.

use crate::document::MapDocument;

/// Maximum number of snapshots retained.
pub const MAX_HISTORY: usize = 50;

/// An ordered sequence of whole-document snapshots with a cursor.
///
/// Snapshots are recorded only when a gesture commits, never on
/// intermediate pointer-move events. Undo and redo just move the cursor;
/// recording after an undo truncates the abandoned redo tail.
#[derive(Debug, Clone, Default)]
pub struct HistoryStack {
    entries: Vec<MapDocument>,
    index: usize,
}

impl HistoryStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start over from a single baseline snapshot (session creation, load).
    pub fn reset(&mut self, baseline: &MapDocument) {
        self.entries.clear();
        self.entries.push(baseline.clone());
        self.index = 0;
    }

    /// Record a snapshot after a committed mutation.
    ///
    /// Drops any redo tail, appends a deep copy, and evicts the oldest
    /// entry once the cap is exceeded.
    pub fn record(&mut self, document: &MapDocument) {
        if !self.entries.is_empty() {
            self.entries.truncate(self.index + 1);
        }
        self.entries.push(document.clone());
        self.index = self.entries.len() - 1;

        if self.entries.len() > MAX_HISTORY {
            self.entries.remove(0);
            self.index -= 1;
        }
    }

    pub fn can_undo(&self) -> bool {
        self.index > 0
    }

    pub fn can_redo(&self) -> bool {
        !self.entries.is_empty() && self.index + 1 < self.entries.len()
    }

    /// Step back one snapshot. Returns `None` at the oldest entry.
    pub fn undo(&mut self) -> Option<MapDocument> {
        if !self.can_undo() {
            return None;
        }
        self.index -= 1;
        Some(self.entries[self.index].clone())
    }

    /// Step forward one snapshot. Returns `None` at the newest entry.
    pub fn redo(&mut self) -> Option<MapDocument> {
        if !self.can_redo() {
            return None;
        }
        self.index += 1;
        Some(self.entries[self.index].clone())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
