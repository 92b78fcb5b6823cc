//! Host input events fed to [`EditorSession::handle`](crate::session::EditorSession::handle).
//!
//! Pointer positions are screen (client) pixels; the session maps them to
//! canvas space.

use serde::{Deserialize, Serialize};

/// Events the editor responds to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InputEvent {
    /// Mouse button pressed.
    PointerDown {
        #[serde(default)]
        button: MouseButton,
        x: f32,
        y: f32,
    },
    /// Mouse moved.
    PointerMove { x: f32, y: f32 },
    /// Mouse button released.
    PointerUp {
        #[serde(default)]
        button: MouseButton,
        x: f32,
        y: f32,
    },
    /// Primary button double-clicked.
    DoubleClick { x: f32, y: f32 },
    /// Wheel scrolled. Positive `delta_y` scrolls down (zooms out).
    Wheel { delta_y: f32, x: f32, y: f32 },
    /// Keyboard key pressed.
    KeyDown {
        key: Key,
        #[serde(default)]
        modifiers: Modifiers,
    },
}

/// Mouse buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MouseButton {
    #[default]
    Left,
    Right,
    Middle,
    Other(u16),
}

/// Keyboard keys the editor distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Key {
    Char(char),
    Enter,
    Escape,
    Backspace,
    Delete,
    Tab,
    Space,
}

/// Keyboard modifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
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

    pub fn ctrl() -> Self {
        Self {
            ctrl: true,
            ..Self::NONE
        }
    }

    pub fn ctrl_shift() -> Self {
        Self {
            ctrl: true,
            shift: true,
            ..Self::NONE
        }
    }

    /// Ctrl or Cmd held.
    pub fn command(&self) -> bool {
        self.ctrl || self.meta
    }
}
