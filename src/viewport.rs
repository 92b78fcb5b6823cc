//! Viewport transform between screen space and canvas space.
//!
//! Screen coordinates are client pixels (what pointer events carry). The
//! canvas element sits at [`CanvasBounds::left`]/[`CanvasBounds::top`] in that
//! space; "local" coordinates are screen coordinates relative to the element.
//!
//! `screen = canvas * scale + offset + bounds.origin`

use serde::{Deserialize, Serialize};

use crate::constants::zoom;
use crate::geometry::Point;
use crate::tool::Tool;

/// Placement and size of the canvas element in screen space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CanvasBounds {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl CanvasBounds {
    pub fn new(left: f32, top: f32, width: f32, height: f32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// Bounds of a canvas at the screen origin.
    pub fn sized(width: f32, height: f32) -> Self {
        Self::new(0.0, 0.0, width, height)
    }

    /// Screen position relative to the canvas element.
    pub fn to_local(&self, screen_x: f32, screen_y: f32) -> (f32, f32) {
        (screen_x - self.left, screen_y - self.top)
    }
}

/// Zoom clamp range and wheel step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoomLimits {
    #[serde(default = "default_min")]
    pub min: f32,
    #[serde(default = "default_max")]
    pub max: f32,
    #[serde(default = "default_step")]
    pub step: f32,
}

fn default_min() -> f32 {
    zoom::MIN
}

fn default_max() -> f32 {
    zoom::MAX
}

fn default_step() -> f32 {
    zoom::STEP
}

impl Default for ZoomLimits {
    fn default() -> Self {
        Self {
            min: zoom::MIN,
            max: zoom::MAX,
            step: zoom::STEP,
        }
    }
}

impl ZoomLimits {
    /// Clamp `scale` into range. Lower bound wins if the limits are inverted.
    pub fn clamp(&self, scale: f32) -> f32 {
        scale.min(self.max).max(self.min)
    }
}

/// Scale and translation of the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub scale: f32,
    pub offset_x: f32,
    pub offset_y: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self::identity()
    }
}

impl Viewport {
    pub fn new(scale: f32, offset_x: f32, offset_y: f32) -> Self {
        Self {
            scale,
            offset_x,
            offset_y,
        }
    }

    /// Scale 1, no offset.
    pub fn identity() -> Self {
        Self::new(1.0, 0.0, 0.0)
    }

    /// Map a screen position to canvas space.
    pub fn screen_to_canvas(&self, screen_x: f32, screen_y: f32, bounds: &CanvasBounds) -> Point {
        let (local_x, local_y) = bounds.to_local(screen_x, screen_y);
        self.local_to_canvas(local_x, local_y)
    }

    /// Exact inverse of [`Viewport::screen_to_canvas`].
    pub fn canvas_to_screen(&self, point: Point, bounds: &CanvasBounds) -> (f32, f32) {
        let (local_x, local_y) = self.canvas_to_local(point);
        (local_x + bounds.left, local_y + bounds.top)
    }

    /// Map an element-local position to canvas space.
    pub fn local_to_canvas(&self, local_x: f32, local_y: f32) -> Point {
        Point::new(
            (local_x - self.offset_x) / self.scale,
            (local_y - self.offset_y) / self.scale,
        )
    }

    /// Map a canvas position to element-local pixels.
    pub fn canvas_to_local(&self, point: Point) -> (f32, f32) {
        (
            point.x * self.scale + self.offset_x,
            point.y * self.scale + self.offset_y,
        )
    }

    /// Change the scale by `delta` wheel steps, clamped to `limits`.
    ///
    /// With a `center` (element-local pixels) the offset is adjusted so the
    /// canvas point under the center stays put on screen.
    pub fn zoom(&mut self, delta: f32, center: Option<(f32, f32)>, limits: &ZoomLimits) {
        let new_scale = limits.clamp(self.scale + delta * limits.step);

        if let Some((center_x, center_y)) = center {
            let ratio = new_scale / self.scale;
            self.offset_x = center_x - (center_x - self.offset_x) * ratio;
            self.offset_y = center_y - (center_y - self.offset_y) * ratio;
        }

        self.scale = new_scale;
    }

    /// Shift the offset. Panning is unbounded.
    pub fn pan(&mut self, dx: f32, dy: f32) {
        self.offset_x += dx;
        self.offset_y += dy;
    }

    /// Set the scale directly (clamped), leaving the offset alone.
    pub fn set_scale(&mut self, scale: f32, limits: &ZoomLimits) {
        self.scale = limits.clamp(scale);
    }

    pub fn reset(&mut self) {
        *self = Self::identity();
    }
}

/// Per-image view state owned by the editing session.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CanvasViewState {
    pub viewport: Viewport,
    pub is_dragging: bool,
    pub current_tool: Tool,
}

impl CanvasViewState {
    /// Back to scale 1 and zero offset; the current tool is kept.
    pub fn reset(&mut self) {
        self.viewport.reset();
        self.is_dragging = false;
    }
}
