//! Global constants for the annotation editor.
//!
//! These are the defaults; most of them can be overridden through
//! [`EditorConfig`](crate::config::EditorConfig).

/// Minimum width and height (exclusive, canvas units) of a committed rectangle.
pub const MIN_RECTANGLE_SIZE: f32 = 5.0;

/// Minimum number of vertices for a closed polygon.
pub const MIN_POLYGON_VERTICES: usize = 3;

/// Click tolerance for point and keypoint annotations, in canvas units.
pub const POINT_HIT_RADIUS: f32 = 10.0;

/// Maximum number of retained history snapshots.
pub const MAX_HISTORY_SNAPSHOTS: usize = 50;

/// Category assigned to new annotations when none is configured.
pub const DEFAULT_CATEGORY: &str = "default";

/// Zoom limits and step size.
pub mod zoom {
    /// Smallest allowed scale.
    pub const MIN: f32 = 0.1;
    /// Largest allowed scale.
    pub const MAX: f32 = 5.0;
    /// Scale change per wheel notch.
    pub const STEP: f32 = 0.1;
}

/// Rendering style constants.
pub mod style {
    /// Colour of committed annotations whose category is unknown.
    pub const FALLBACK_ANNOTATION_COLOR: &str = "#00ff00";
    /// Colour of the in-progress shape when no category colour matches.
    pub const FALLBACK_DRAWING_COLOR: &str = "#ff0000";

    /// Stroke width of unselected annotations.
    pub const STROKE_WIDTH: f32 = 2.0;
    /// Stroke width of the selected annotation.
    pub const SELECTED_STROKE_WIDTH: f32 = 3.0;
    /// Fill alpha of unselected annotations.
    pub const FILL_ALPHA: f32 = 0.1;
    /// Fill alpha of the selected annotation.
    pub const SELECTED_FILL_ALPHA: f32 = 0.2;
    /// Darkening factor applied to the selected annotation colour.
    pub const SELECTED_DARKEN: f32 = 0.3;

    /// Dash pattern of the in-progress shape.
    pub const DRAFT_DASH: [f32; 2] = [5.0, 5.0];

    /// Radius of polygon vertex markers.
    pub const VERTEX_RADIUS: f32 = 4.0;
    /// Radius of point markers.
    pub const POINT_RADIUS: f32 = 6.0;
    /// Half length of the keypoint cross arms.
    pub const KEYPOINT_ARM: f32 = 8.0;
    /// Radius of the keypoint centre dot.
    pub const KEYPOINT_DOT_RADIUS: f32 = 3.0;

    /// Label font size in screen pixels.
    pub const LABEL_FONT_PX: f32 = 12.0;
    /// Label text colour.
    pub const LABEL_COLOR: &str = "#000000";
    /// Vertical label offset above the anchor.
    pub const LABEL_OFFSET_Y: f32 = -5.0;
    /// Horizontal label offset for point-like annotations.
    pub const POINT_LABEL_OFFSET_X: f32 = 10.0;

    /// Crosshair line colour.
    pub const CROSSHAIR_COLOR: &str = "#00ff00";
    /// Crosshair outline width.
    pub const CROSSHAIR_OUTLINE_WIDTH: f32 = 4.0;
    /// Crosshair line width.
    pub const CROSSHAIR_WIDTH: f32 = 2.0;
    /// Crosshair outline alpha (black).
    pub const CROSSHAIR_OUTLINE_ALPHA: f32 = 0.8;
    /// Crosshair centre marker radius.
    pub const CROSSHAIR_DOT_RADIUS: f32 = 4.0;
}
