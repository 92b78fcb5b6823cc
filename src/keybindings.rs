//! Customizable keybindings for the annotation editor.
//!
//! Tool hotkeys are single characters matched case-insensitively. The edit
//! shortcuts (undo, redo, delete, cancel) are fixed.

use serde::{Deserialize, Serialize};

use crate::input::{Key, Modifiers};
use crate::tool::Tool;

/// Editor actions a key press can trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorAction {
    Undo,
    Redo,
    /// Delete the selected annotation.
    DeleteSelected,
    /// Abandon the in-progress shape and clear the selection.
    Cancel,
    SelectTool(Tool),
}

/// Keybinding configuration for the tools.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyBindings {
    /// Hotkey for Select tool
    pub tool_select: char,
    /// Hotkey for Rectangle tool
    pub tool_rectangle: char,
    /// Hotkey for Polygon tool
    pub tool_polygon: char,
    /// Hotkey for Point tool
    pub tool_point: char,
    /// Hotkey for Keypoint tool
    pub tool_keypoint: char,
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            tool_select: 'v',
            tool_rectangle: 'r',
            tool_polygon: 'p',
            tool_point: 'o',
            tool_keypoint: 'k',
        }
    }
}

impl KeyBindings {
    /// Create new keybindings with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the tool that corresponds to a character, if any.
    pub fn tool_for_key(&self, key: char) -> Option<Tool> {
        Tool::all()
            .into_iter()
            .find(|tool| self.key_for_tool(*tool).eq_ignore_ascii_case(&key))
    }

    /// Get the hotkey for a specific tool.
    pub fn key_for_tool(&self, tool: Tool) -> char {
        match tool {
            Tool::Select => self.tool_select,
            Tool::Rectangle => self.tool_rectangle,
            Tool::Polygon => self.tool_polygon,
            Tool::Point => self.tool_point,
            Tool::Keypoint => self.tool_keypoint,
        }
    }

    /// Set the hotkey for a tool.
    pub fn set_tool_key(&mut self, tool: Tool, key: char) {
        match tool {
            Tool::Select => self.tool_select = key,
            Tool::Rectangle => self.tool_rectangle = key,
            Tool::Polygon => self.tool_polygon = key,
            Tool::Point => self.tool_point = key,
            Tool::Keypoint => self.tool_keypoint = key,
        }
    }

    /// Check if a key is already used by another tool.
    /// Returns a description of what it's used for, if anything.
    pub fn key_conflict(&self, key: char, exclude_tool: Option<Tool>) -> Option<String> {
        Tool::all()
            .into_iter()
            .filter(|tool| Some(*tool) != exclude_tool)
            .find(|tool| self.key_for_tool(*tool).eq_ignore_ascii_case(&key))
            .map(|tool| format!("{} tool", tool))
    }

    /// Whether two tools share a key.
    pub fn has_conflicts(&self) -> bool {
        Tool::all()
            .into_iter()
            .any(|tool| self.key_conflict(self.key_for_tool(tool), Some(tool)).is_some())
    }

    /// Resolve a key press to an editor action.
    ///
    /// Undo is Ctrl+Z; redo is Ctrl+Y or Ctrl+Shift+Z. Cmd counts as Ctrl.
    /// Tool hotkeys are ignored while Ctrl, Cmd or Alt is held.
    pub fn action_for(&self, key: Key, modifiers: Modifiers) -> Option<EditorAction> {
        match key {
            Key::Escape => Some(EditorAction::Cancel),
            Key::Delete => Some(EditorAction::DeleteSelected),
            Key::Char(c) if modifiers.command() => {
                if modifiers.alt {
                    return None;
                }
                match (c.to_ascii_lowercase(), modifiers.shift) {
                    ('z', false) => Some(EditorAction::Undo),
                    ('z', true) | ('y', false) => Some(EditorAction::Redo),
                    _ => None,
                }
            }
            Key::Char(_) if modifiers.alt => None,
            Key::Char(c) => self.tool_for_key(c).map(EditorAction::SelectTool),
            _ => None,
        }
    }
}
