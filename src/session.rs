//! Editing session: the context object that wires viewport, tools, store,
//! rendering and export together for one open editor.
//!
//! Hosts feed [`InputEvent`]s to [`EditorSession::handle`] and repaint with
//! [`EditorSession::render`] whenever it returns `true`. Nothing here panics
//! or returns an error across the interaction boundary; failures are logged
//! and absorbed as no-ops.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use crate::clock::{self, IdGenerator};
use crate::config::EditorConfig;
use crate::format::{DatasetView, ExportFormat, FormatError, FormatRegistry, VocDocument, formats};
use crate::geometry::Point;
use crate::hit_test::hit_test;
use crate::input::{InputEvent, MouseButton};
use crate::keybindings::EditorAction;
use crate::model::{Annotation, Category, ImageInfo, ProjectContext, ProjectInfo, Shape};
use crate::persistence::{AnnotationRepository, PersistenceError};
use crate::render::{Frame, Palette, Scene, render_frame};
use crate::store::AnnotationStore;
use crate::tool::{InteractionState, Tool, ToolOutput, ToolStateMachine};
use crate::viewport::{CanvasBounds, CanvasViewState, Viewport};

/// Load state of the current image.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ImageState {
    /// No image selected.
    #[default]
    None,
    /// Requested from the host; interaction stays disabled.
    Loading,
    Loaded,
    /// The host reported a load failure.
    Failed(String),
}

impl fmt::Display for ImageState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageState::None => f.write_str("none"),
            ImageState::Loading => f.write_str("loading"),
            ImageState::Loaded => f.write_str("loaded"),
            ImageState::Failed(reason) => write!(f, "failed ({})", reason),
        }
    }
}

/// Editor state exposed to the host UI.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UiState {
    pub tool: Tool,
    pub is_drawing: bool,
    pub is_dragging: bool,
    /// Last known cursor position, canvas space.
    pub cursor: Point,
    pub can_undo: bool,
    pub can_redo: bool,
    pub selected_id: Option<String>,
    pub scale: f32,
    pub image_loaded: bool,
    /// Annotations on the current image.
    pub annotation_count: usize,
}

/// One editing session.
#[derive(Debug, Clone)]
pub struct EditorSession {
    config: EditorConfig,
    palette: Palette,
    bounds: CanvasBounds,
    view: CanvasViewState,
    store: AnnotationStore,
    tools: ToolStateMachine,
    project: Option<ProjectInfo>,
    context: ProjectContext,
    images: Vec<ImageInfo>,
    current_image: Option<ImageInfo>,
    image_state: ImageState,
    cursor: Point,
    ids: IdGenerator,
    formats: Arc<FormatRegistry>,
}

impl Default for EditorSession {
    fn default() -> Self {
        Self::new(EditorConfig::default())
    }
}

impl EditorSession {
    pub fn new(config: EditorConfig) -> Self {
        Self {
            palette: config.palette(),
            store: AnnotationStore::with_limits(config.history_limit, config.min_rectangle_size),
            tools: ToolStateMachine::new(config.min_rectangle_size),
            config,
            bounds: CanvasBounds::default(),
            view: CanvasViewState::default(),
            project: None,
            context: ProjectContext::default(),
            images: Vec::new(),
            current_image: None,
            image_state: ImageState::None,
            cursor: Point::default(),
            ids: IdGenerator::new(),
            formats: Arc::new(FormatRegistry::new()),
        }
    }

    /// Replace the exporters available to [`EditorSession::export_as`].
    pub fn with_formats(mut self, formats: FormatRegistry) -> Self {
        self.formats = Arc::new(formats);
        self
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn store(&self) -> &AnnotationStore {
        &self.store
    }

    /// Direct store access for host-driven edits (property panels, bulk loads).
    pub fn store_mut(&mut self) -> &mut AnnotationStore {
        &mut self.store
    }

    pub fn viewport(&self) -> Viewport {
        self.view.viewport
    }

    pub fn view_state(&self) -> &CanvasViewState {
        &self.view
    }

    pub fn bounds(&self) -> CanvasBounds {
        self.bounds
    }

    pub fn tool(&self) -> Tool {
        self.tools.tool()
    }

    pub fn interaction(&self) -> &InteractionState {
        self.tools.state()
    }

    /// Last known cursor position, canvas space.
    pub fn cursor(&self) -> Point {
        self.cursor
    }

    pub fn project(&self) -> Option<&ProjectInfo> {
        self.project.as_ref()
    }

    pub fn images(&self) -> &[ImageInfo] {
        &self.images
    }

    pub fn current_image(&self) -> Option<&ImageInfo> {
        self.current_image.as_ref()
    }

    pub fn image_state(&self) -> &ImageState {
        &self.image_state
    }

    pub fn is_image_loaded(&self) -> bool {
        self.image_state == ImageState::Loaded
    }

    /// Annotations of the current image, in store order.
    pub fn current_image_annotations(&self) -> Vec<&Annotation> {
        match &self.current_image {
            Some(image) => self.store.for_image(&image.id).collect(),
            None => Vec::new(),
        }
    }

    /// Category new annotations are committed with.
    pub fn current_category(&self) -> &str {
        self.context
            .current_category_or(&self.config.default_category)
    }

    pub fn ui_state(&self) -> UiState {
        UiState {
            tool: self.tools.tool(),
            is_drawing: self.tools.is_drawing(),
            is_dragging: self.view.is_dragging,
            cursor: self.cursor,
            can_undo: self.store.can_undo(),
            can_redo: self.store.can_redo(),
            selected_id: self.store.selected_id().map(str::to_string),
            scale: self.view.viewport.scale,
            image_loaded: self.is_image_loaded(),
            annotation_count: self.current_image_annotations().len(),
        }
    }

    // ========================================================================
    // Host context
    // ========================================================================

    pub fn set_project(&mut self, project: Option<ProjectInfo>) {
        self.project = project;
    }

    pub fn set_categories(&mut self, categories: Vec<Category>) {
        log::debug!("Categories updated: {}", categories.len());
        self.context.categories = categories;
    }

    /// Set the category used for subsequent commits.
    pub fn set_current_category(&mut self, name: Option<String>) {
        self.context.set_current_category(name);
    }

    /// Replace the image metadata list used for export.
    pub fn set_images(&mut self, images: Vec<ImageInfo>) {
        self.images = images;
    }

    /// Place the canvas element in screen space.
    pub fn set_bounds(&mut self, bounds: CanvasBounds) {
        self.bounds = bounds;
    }

    /// Resize the canvas element, keeping its position.
    pub fn resize(&mut self, width: f32, height: f32) {
        self.bounds.width = width;
        self.bounds.height = height;
        log::debug!("Canvas resized to {}x{}", width, height);
    }

    // ========================================================================
    // Image lifecycle
    // ========================================================================

    /// Make `image` the active image. Interaction stays disabled until
    /// [`EditorSession::image_loaded`] is called.
    ///
    /// Re-selecting the active image is a no-op.
    pub fn set_image(&mut self, image: ImageInfo) -> bool {
        if self.current_image.as_ref().is_some_and(|cur| cur.id == image.id) {
            return false;
        }

        log::info!("Loading image '{}' ({})", image.filename, image.id);
        if !self.images.iter().any(|img| img.id == image.id) {
            self.images.push(image.clone());
        }
        self.tools.reset();
        self.view.is_dragging = false;
        self.store.select(None);
        self.current_image = Some(image);
        self.image_state = ImageState::Loading;
        true
    }

    /// The host finished loading the active image.
    ///
    /// Resets the viewport and any drawing state.
    pub fn image_loaded(&mut self) -> bool {
        let Some(image) = &self.current_image else {
            log::debug!("Image load reported without an active image");
            return false;
        };

        log::info!("Image '{}' loaded ({}x{})", image.filename, image.width, image.height);
        self.view.reset();
        self.tools.reset();
        self.image_state = ImageState::Loaded;
        true
    }

    /// The host failed to load the active image. Interaction stays disabled.
    pub fn image_failed(&mut self, reason: impl Into<String>) {
        let reason = reason.into();
        match &self.current_image {
            Some(image) => log::error!("Failed to load image '{}': {}", image.filename, reason),
            None => log::error!("Failed to load image: {}", reason),
        }
        self.tools.reset();
        self.view.is_dragging = false;
        self.image_state = ImageState::Failed(reason);
    }

    // ========================================================================
    // Input
    // ========================================================================

    /// Feed one input event. Returns whether a repaint is needed.
    pub fn handle(&mut self, event: InputEvent) -> bool {
        match event {
            InputEvent::KeyDown { key, modifiers } => {
                match self.config.keybindings.action_for(key, modifiers) {
                    Some(action) => self.apply_action(action),
                    None => false,
                }
            }
            _ if !self.is_image_loaded() => {
                log::trace!("Pointer input ignored: image {}", self.image_state);
                false
            }
            InputEvent::PointerDown { button, x, y } => {
                let canvas = self.track_cursor(x, y);
                match button {
                    MouseButton::Left => {
                        let output = match &self.current_image {
                            Some(image) => {
                                let store = &self.store;
                                let radius = self.config.point_hit_radius;
                                self.tools.press(canvas, (x, y), |point| {
                                    hit_test(store.for_image(&image.id), point, radius)
                                        .map(|ann| ann.id.clone())
                                })
                            }
                            None => ToolOutput::None,
                        };
                        self.apply(output)
                    }
                    MouseButton::Right => {
                        let output = self.tools.finish_polygon();
                        self.apply(output)
                    }
                    MouseButton::Middle | MouseButton::Other(_) => false,
                }
            }
            InputEvent::PointerMove { x, y } => {
                let canvas = self.track_cursor(x, y);
                let output = self.tools.move_to(canvas, (x, y));
                self.apply(output);
                // The crosshair follows the cursor.
                true
            }
            InputEvent::PointerUp { button, x, y } => {
                if button != MouseButton::Left && !self.tools.is_dragging() {
                    return false;
                }
                let canvas = self.track_cursor(x, y);
                let output = self.tools.release(canvas);
                self.apply(output)
            }
            InputEvent::DoubleClick { x, y } => {
                self.track_cursor(x, y);
                let output = self.tools.finish_polygon();
                self.apply(output)
            }
            InputEvent::Wheel { delta_y, x, y } => {
                let delta = if delta_y > 0.0 { -1.0 } else { 1.0 };
                let center = self.bounds.to_local(x, y);
                self.zoom(delta, Some(center));
                true
            }
        }
    }

    fn track_cursor(&mut self, x: f32, y: f32) -> Point {
        self.cursor = self.view.viewport.screen_to_canvas(x, y, &self.bounds);
        self.cursor
    }

    fn apply(&mut self, output: ToolOutput) -> bool {
        match output {
            ToolOutput::None => false,
            ToolOutput::Preview | ToolOutput::Discarded | ToolOutput::Abandoned => true,
            ToolOutput::Select(id) => {
                log::debug!("Selected annotation '{}'", id);
                self.store.select(Some(&id));
                true
            }
            ToolOutput::StartPan => {
                self.store.select(None);
                self.view.is_dragging = true;
                true
            }
            ToolOutput::Pan { dx, dy } => {
                self.pan(dx, dy);
                true
            }
            ToolOutput::EndPan => {
                self.view.is_dragging = false;
                true
            }
            ToolOutput::Commit(shape) => {
                self.commit(shape);
                true
            }
        }
    }

    /// Commit a finished shape to the active image with the current category.
    fn commit(&mut self, shape: Shape) -> bool {
        let Some(image) = &self.current_image else {
            log::debug!("Commit without an active image ignored");
            return false;
        };

        let annotation = Annotation::new(
            self.ids.next_id(),
            image.id.clone(),
            self.current_category(),
            shape,
            clock::now_iso8601(),
        );
        self.store.add(annotation)
    }

    /// Run an editor action (normally resolved from a key press).
    pub fn apply_action(&mut self, action: EditorAction) -> bool {
        match action {
            EditorAction::Undo => self.undo(),
            EditorAction::Redo => self.redo(),
            EditorAction::DeleteSelected => self.delete_selected(),
            EditorAction::Cancel => {
                let abandoned = self.tools.cancel() == ToolOutput::Abandoned;
                let had_selection = self.store.selected_id().is_some();
                self.store.select(None);
                abandoned || had_selection
            }
            EditorAction::SelectTool(tool) => self.set_tool(tool),
        }
    }

    // ========================================================================
    // Imperative triggers
    // ========================================================================

    /// Switch tools. An in-progress shape is discarded.
    pub fn set_tool(&mut self, tool: Tool) -> bool {
        if self.tools.set_tool(tool) == ToolOutput::EndPan {
            self.view.is_dragging = false;
        }
        self.view.current_tool = tool;
        true
    }

    /// Zoom by `delta` wheel steps around an element-local center.
    pub fn zoom(&mut self, delta: f32, center: Option<(f32, f32)>) {
        self.view.viewport.zoom(delta, center, &self.config.zoom);
        log::trace!("🔍 Zoom: {:.2}x", self.view.viewport.scale);
    }

    pub fn pan(&mut self, dx: f32, dy: f32) {
        self.view.viewport.pan(dx, dy);
    }

    /// Back to scale 1 and zero offset.
    pub fn reset_view(&mut self) {
        self.view.viewport.reset();
        log::debug!("🔄 View reset");
    }

    pub fn undo(&mut self) -> bool {
        self.store.undo()
    }

    pub fn redo(&mut self) -> bool {
        self.store.redo()
    }

    /// Delete the selected annotation, if any.
    pub fn delete_selected(&mut self) -> bool {
        let Some(id) = self.store.selected_id().map(str::to_string) else {
            return false;
        };
        self.store.delete(&id).is_some()
    }

    // ========================================================================
    // Rendering
    // ========================================================================

    /// Build the display list for the current state.
    pub fn render(&self) -> Frame {
        let image = self
            .current_image
            .as_ref()
            .filter(|_| self.is_image_loaded());

        render_frame(&Scene {
            bounds: self.bounds,
            viewport: self.view.viewport,
            image,
            annotations: self.current_image_annotations(),
            selected_id: self.store.selected_id(),
            categories: &self.context.categories,
            interaction: self.tools.state(),
            current_category: self.current_category(),
            cursor: self.cursor,
            palette: &self.palette,
        })
    }

    // ========================================================================
    // Export and persistence
    // ========================================================================

    fn dataset(&self) -> DatasetView<'_> {
        DatasetView::new(self.project.as_ref(), &self.images, self.store.annotations())
    }

    pub fn formats(&self) -> &FormatRegistry {
        &self.formats
    }

    /// Serialize every annotation in the session.
    pub fn export(&self, format: ExportFormat) -> Result<String, FormatError> {
        self.export_as(format.id())
    }

    /// Serialize every annotation with the registered format `id`.
    ///
    /// Annotations the format cannot express are left out, with a warning.
    pub fn export_as(&self, id: &str) -> Result<String, FormatError> {
        let format = self
            .formats
            .get(id)
            .ok_or_else(|| FormatError::UnknownFormat(id.to_string()))?;

        let dropped = self
            .store
            .annotations()
            .iter()
            .filter(|ann| !format.keeps(&ann.shape))
            .count();
        if dropped > 0 {
            log::warn!(
                "💾 {} export leaves out {} annotations it cannot represent",
                format.display_name(),
                dropped
            );
        }

        format.export(&self.dataset())
    }

    /// Per-image Pascal VOC XML documents.
    pub fn export_voc_xml(&self) -> Result<Vec<VocDocument>, FormatError> {
        formats::xml_documents(&self.dataset())
    }

    /// Export in `format` and hand the document to `repo` as `name`.
    pub fn save_export(
        &self,
        repo: &mut dyn AnnotationRepository,
        format: ExportFormat,
        name: &str,
    ) -> bool {
        let result = self
            .export(format)
            .map_err(|e| e.to_string())
            .and_then(|content| repo.save_export(name, &content).map_err(|e| e.to_string()));
        match result {
            Ok(()) => true,
            Err(e) => {
                log::error!("Failed to save {} export '{}': {}", format, name, e);
                false
            }
        }
    }

    /// Persist the annotations of every known image.
    ///
    /// Images without annotations are saved as empty lists so deletions
    /// persist. Returns the number of images written.
    pub fn save(&self, repo: &mut dyn AnnotationRepository) -> usize {
        let mut image_ids: Vec<&str> = self.images.iter().map(|img| img.id.as_str()).collect();
        for ann in self.store.annotations() {
            if !image_ids.contains(&ann.image_id.as_str()) {
                image_ids.push(&ann.image_id);
            }
        }

        let mut saved = 0;
        for image_id in image_ids {
            let annotations: Vec<Annotation> = self.store.for_image(image_id).cloned().collect();
            match repo.save_annotations(image_id, &annotations) {
                Ok(()) => saved += 1,
                Err(e) => log::error!("Failed to save annotations for '{}': {}", image_id, e),
            }
        }
        log::info!("💾 Saved annotations for {} images", saved);
        saved
    }

    /// Replace the annotations of `image_id` with the stored list.
    ///
    /// Returns how many annotations were loaded; failures load nothing.
    pub fn load_annotations(&mut self, repo: &dyn AnnotationRepository, image_id: &str) -> usize {
        match repo.load_annotations(image_id) {
            Ok(loaded) => self.store.replace_image_annotations(image_id, loaded),
            Err(PersistenceError::NotFound(_)) => {
                log::debug!("No stored annotations for image '{}'", image_id);
                0
            }
            Err(e) => {
                log::error!("Failed to load annotations for '{}': {}", image_id, e);
                0
            }
        }
    }
}
