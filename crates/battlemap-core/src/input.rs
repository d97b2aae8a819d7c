//! Keyboard input surface shared by the session.

use serde::{Deserialize, Serialize};

/// Modifier key state accompanying pointer and key events.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        shift: false,
        ctrl: false,
        alt: false,
        meta: false,
    };

    /// Platform command modifier: Ctrl, or Cmd on macOS.
    pub fn command(self) -> bool {
        self.ctrl || self.meta
    }
}

/// A keyboard action recognized by the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Undo,
    Redo,
    DeleteSelection,
    Cancel,
    SelectAll,
}

impl KeyAction {
    /// Map a raw key name plus modifiers to an action.
    ///
    /// Ctrl/Cmd+Z undoes, Ctrl/Cmd+Y or Ctrl/Cmd+Shift+Z redoes,
    /// Delete and Backspace delete the selection, Escape cancels, and
    /// Ctrl/Cmd+A selects all vision blocks.
    pub fn from_key(key: &str, modifiers: Modifiers) -> Option<Self> {
        match key {
            "z" | "Z" if modifiers.command() && modifiers.shift => Some(KeyAction::Redo),
            "z" | "Z" if modifiers.command() => Some(KeyAction::Undo),
            "y" | "Y" if modifiers.command() => Some(KeyAction::Redo),
            "a" | "A" if modifiers.command() => Some(KeyAction::SelectAll),
            "Delete" | "Backspace" => Some(KeyAction::DeleteSelection),
            "Escape" => Some(KeyAction::Cancel),
            _ => None,
        }
    }
}
