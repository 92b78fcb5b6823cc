//! Canvas Annotator - annotation authoring engine
//!
//! The interactive core of an image-annotation editor: a pannable, zoomable
//! viewport, per-tool drawing state machine, topmost-first hit testing,
//! snapshot undo/redo over the annotation set, a display-list render
//! pipeline, and JSON / COCO / Pascal VOC export.
//!
//! Everything is driven through an [`EditorSession`]; the host supplies
//! input events, image load notifications and project metadata, and paints
//! the [`Frame`]s the session renders.

pub mod clock;
pub mod color_utils;
pub mod config;
pub mod constants;
pub mod format;
pub mod geometry;
pub mod history;
pub mod input;
pub mod keybindings;
pub mod model;
pub mod persistence;
pub mod render;
pub mod script;
pub mod session;
pub mod store;
pub mod tool;
pub mod viewport;

pub use config::EditorConfig;
pub use format::{ExportFormat, FormatError};
pub use geometry::{Point, Rect};
pub use input::{InputEvent, Key, Modifiers, MouseButton};
pub use model::{Annotation, AnnotationType, Category, ImageInfo, ProjectInfo, Shape};
pub use render::{DrawCommand, Frame};
pub use session::{EditorSession, UiState};
pub use store::AnnotationStore;
pub use tool::Tool;
pub use viewport::{CanvasBounds, Viewport};
