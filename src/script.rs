//! Replayable session scripts.
//!
//! A script is a JSON document describing the host context (canvas bounds,
//! project, images, categories) and an ordered list of steps: raw input
//! events plus the host-side triggers (image loads, category changes). The
//! binary replays a script headlessly and writes the resulting export.
//!
//! ```json
//! {
//!   "bounds": {"left": 0, "top": 0, "width": 800, "height": 600},
//!   "images": [{"id": "img1", "filename": "a.jpg", "width": 800, "height": 600}],
//!   "steps": [
//!     {"action": "open_image", "image_id": "img1"},
//!     {"action": "input", "event": {"type": "pointer_down", "x": 10, "y": 10}},
//!     {"action": "input", "event": {"type": "pointer_up", "x": 90, "y": 70}}
//!   ]
//! }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::EditorConfig;
use crate::format::FormatError;
use crate::input::InputEvent;
use crate::model::{Category, ImageInfo, ProjectInfo};
use crate::session::EditorSession;
use crate::tool::Tool;
use crate::viewport::CanvasBounds;

/// Errors raised while loading or replaying a script.
#[derive(Error, Debug)]
pub enum ScriptError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid script: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Step {step}: unknown image '{image_id}'")]
    UnknownImage { step: usize, image_id: String },

    #[error("Export failed: {0}")]
    Export(#[from] FormatError),
}

/// One scripted step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ScriptStep {
    /// Feed a host input event.
    Input { event: InputEvent },
    /// Request an image from the script's image list.
    LoadImage { image_id: String },
    /// Report that the requested image finished loading.
    ImageLoaded,
    /// Report that the requested image failed to load.
    ImageFailed { reason: String },
    /// Request an image and report it loaded.
    OpenImage { image_id: String },
    SetCategory { name: Option<String> },
    SetTool { tool: Tool },
    Resize { width: f32, height: f32 },
    /// Zoom by wheel steps around an element-local center.
    Zoom {
        delta: f32,
        #[serde(default)]
        center: Option<[f32; 2]>,
    },
    Pan { dx: f32, dy: f32 },
    Undo,
    Redo,
}

/// A recorded editing session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplayScript {
    #[serde(default = "default_bounds")]
    pub bounds: CanvasBounds,
    #[serde(default)]
    pub project: Option<ProjectInfo>,
    #[serde(default)]
    pub images: Vec<ImageInfo>,
    #[serde(default)]
    pub categories: Vec<Category>,
    #[serde(default)]
    pub current_category: Option<String>,
    #[serde(default)]
    pub steps: Vec<ScriptStep>,
}

fn default_bounds() -> CanvasBounds {
    CanvasBounds::sized(800.0, 600.0)
}

impl ReplayScript {
    pub fn from_json(json: &str) -> Result<Self, ScriptError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ScriptError> {
        let json = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&json)
    }

    /// Build a session from the script's context and replay every step.
    pub fn run(&self, config: EditorConfig) -> Result<EditorSession, ScriptError> {
        let mut session = EditorSession::new(config);
        session.set_bounds(self.bounds);
        session.set_project(self.project.clone());
        session.set_images(self.images.clone());
        session.set_categories(self.categories.clone());
        session.set_current_category(self.current_category.clone());

        let mut repaints = 0usize;
        for (idx, step) in self.steps.iter().enumerate() {
            log::trace!("Step {}: {:?}", idx + 1, step);
            if self.apply(&mut session, idx + 1, step)? {
                repaints += 1;
            }
        }

        log::info!(
            "Replayed {} steps ({} repaints), {} annotations",
            self.steps.len(),
            repaints,
            session.store().len()
        );
        Ok(session)
    }

    fn image(&self, step: usize, image_id: &str) -> Result<ImageInfo, ScriptError> {
        self.images
            .iter()
            .find(|img| img.id == image_id)
            .cloned()
            .ok_or_else(|| ScriptError::UnknownImage {
                step,
                image_id: image_id.to_string(),
            })
    }

    fn apply(
        &self,
        session: &mut EditorSession,
        step: usize,
        action: &ScriptStep,
    ) -> Result<bool, ScriptError> {
        let repaint = match action {
            ScriptStep::Input { event } => session.handle(event.clone()),
            ScriptStep::LoadImage { image_id } => session.set_image(self.image(step, image_id)?),
            ScriptStep::ImageLoaded => session.image_loaded(),
            ScriptStep::ImageFailed { reason } => {
                session.image_failed(reason.clone());
                true
            }
            ScriptStep::OpenImage { image_id } => {
                session.set_image(self.image(step, image_id)?);
                session.image_loaded()
            }
            ScriptStep::SetCategory { name } => {
                session.set_current_category(name.clone());
                false
            }
            ScriptStep::SetTool { tool } => session.set_tool(*tool),
            ScriptStep::Resize { width, height } => {
                session.resize(*width, *height);
                true
            }
            ScriptStep::Zoom { delta, center } => {
                session.zoom(*delta, center.map(|[x, y]| (x, y)));
                true
            }
            ScriptStep::Pan { dx, dy } => {
                session.pan(*dx, *dy);
                true
            }
            ScriptStep::Undo => session.undo(),
            ScriptStep::Redo => session.redo(),
        };
        Ok(repaint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::ExportFormat;
    use crate::geometry::{Point, Rect};
    use crate::model::Shape;

    const SCRIPT: &str = r##"{
        "bounds": {"left": 0, "top": 0, "width": 800, "height": 600},
        "project": {"id": "p1", "name": "Demo"},
        "images": [{"id": "img1", "filename": "a.jpg", "width": 800, "height": 600}],
        "categories": [{"id": "1", "name": "car", "color": "#ff0000"}],
        "current_category": "car",
        "steps": [
            {"action": "open_image", "image_id": "img1"},
            {"action": "input", "event": {"type": "pointer_down", "x": 10, "y": 10}},
            {"action": "input", "event": {"type": "pointer_move", "x": 60, "y": 50}},
            {"action": "input", "event": {"type": "pointer_up", "x": 90, "y": 70}},
            {"action": "input", "event": {"type": "key_down", "key": {"char": "p"}}},
            {"action": "input", "event": {"type": "pointer_down", "x": 100, "y": 100}},
            {"action": "input", "event": {"type": "pointer_down", "x": 200, "y": 100}},
            {"action": "input", "event": {"type": "pointer_down", "x": 200, "y": 200}},
            {"action": "input", "event": {"type": "double_click", "x": 200, "y": 200}},
            {"action": "set_category", "name": "tree"},
            {"action": "set_tool", "tool": "point"},
            {"action": "input", "event": {"type": "pointer_down", "x": 5, "y": 5}}
        ]
    }"##;

    #[test]
    fn test_replay_builds_annotations() {
        let script = ReplayScript::from_json(SCRIPT).unwrap();
        let session = script.run(EditorConfig::default()).unwrap();

        let anns = session.store().annotations();
        assert_eq!(anns.len(), 3);
        assert_eq!(anns[0].shape, Shape::Rectangle(Rect::new(10.0, 10.0, 80.0, 60.0)));
        assert_eq!(anns[0].category, "car");
        assert_eq!(
            anns[1].shape,
            Shape::Polygon(vec![
                Point::new(100.0, 100.0),
                Point::new(200.0, 100.0),
                Point::new(200.0, 200.0),
            ])
        );
        assert_eq!(anns[2].shape, Shape::Point(Point::new(5.0, 5.0)));
        assert_eq!(anns[2].category, "tree");
    }

    #[test]
    fn test_replay_then_export() {
        let script = ReplayScript::from_json(SCRIPT).unwrap();
        let session = script.run(EditorConfig::default()).unwrap();

        let voc: serde_json::Value =
            serde_json::from_str(&session.export(ExportFormat::Voc).unwrap()).unwrap();
        assert_eq!(voc[0]["annotation"]["folder"], "Demo");
        assert_eq!(voc[0]["annotation"]["object"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_undo_steps() {
        let mut script = ReplayScript::from_json(SCRIPT).unwrap();
        script.steps.push(ScriptStep::Undo);
        script.steps.push(ScriptStep::Undo);
        let session = script.run(EditorConfig::default()).unwrap();
        assert_eq!(session.store().len(), 1);
    }

    #[test]
    fn test_unknown_image_fails() {
        let json = r#"{"steps": [{"action": "open_image", "image_id": "missing"}]}"#;
        let script = ReplayScript::from_json(json).unwrap();
        assert!(matches!(
            script.run(EditorConfig::default()),
            Err(ScriptError::UnknownImage { step: 1, .. })
        ));
    }

    #[test]
    fn test_failed_image_blocks_drawing() {
        let json = r#"{
            "images": [{"id": "img1", "filename": "a.jpg", "width": 10, "height": 10}],
            "steps": [
                {"action": "load_image", "image_id": "img1"},
                {"action": "image_failed", "reason": "404"},
                {"action": "input", "event": {"type": "pointer_down", "x": 1, "y": 1}},
                {"action": "input", "event": {"type": "pointer_up", "x": 50, "y": 50}}
            ]
        }"#;
        let session = ReplayScript::from_json(json)
            .unwrap()
            .run(EditorConfig::default())
            .unwrap();
        assert!(session.store().is_empty());
    }

    #[test]
    fn test_default_bounds() {
        let script = ReplayScript::from_json("{}").unwrap();
        assert_eq!(script.bounds, CanvasBounds::sized(800.0, 600.0));
        assert!(script.steps.is_empty());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, SCRIPT).unwrap();
        let script = ReplayScript::load(&path).unwrap();
        assert_eq!(script.steps.len(), 12);
    }
}
