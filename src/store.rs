//! The authoritative annotation set, the current selection and the
//! undo/redo history.
//!
//! Every structural mutation (add, update, delete, clear, load) records a
//! full snapshot of the annotation sequence. Selection changes do not.

use crate::clock;
use crate::constants::{MAX_HISTORY_SNAPSHOTS, MIN_RECTANGLE_SIZE};
use crate::history::SnapshotHistory;
use crate::model::{Annotation, AnnotationId, AnnotationPatch};

/// Annotation storage for one editing session (all images).
#[derive(Debug, Clone)]
pub struct AnnotationStore {
    /// Annotations in insertion order; later entries are drawn on top.
    annotations: Vec<Annotation>,
    /// Currently selected annotation ID.
    selected: Option<AnnotationId>,
    history: SnapshotHistory<Vec<Annotation>>,
    min_rectangle_size: f32,
}

impl Default for AnnotationStore {
    fn default() -> Self {
        Self::new()
    }
}

impl AnnotationStore {
    pub fn new() -> Self {
        Self::with_limits(MAX_HISTORY_SNAPSHOTS, MIN_RECTANGLE_SIZE)
    }

    /// Create a store with a custom history capacity and commit threshold.
    pub fn with_limits(history_limit: usize, min_rectangle_size: f32) -> Self {
        Self {
            annotations: Vec::new(),
            selected: None,
            history: SnapshotHistory::new(Vec::new(), history_limit),
            min_rectangle_size,
        }
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// All annotations, in insertion order.
    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    /// Annotations belonging to `image_id`, in insertion order.
    ///
    /// Derived on demand; there is no separate per-image store.
    pub fn for_image<'a>(
        &'a self,
        image_id: &'a str,
    ) -> impl DoubleEndedIterator<Item = &'a Annotation> + 'a {
        self.annotations
            .iter()
            .filter(move |ann| ann.image_id == image_id)
    }

    pub fn get(&self, id: &str) -> Option<&Annotation> {
        self.annotations.iter().find(|ann| ann.id == id)
    }

    pub fn len(&self) -> usize {
        self.annotations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.annotations.is_empty()
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn history_cursor(&self) -> usize {
        self.history.cursor()
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    /// Append an annotation.
    ///
    /// Geometry below the commit threshold and duplicate ids are refused.
    pub fn add(&mut self, annotation: Annotation) -> bool {
        if !annotation.shape.is_committable(self.min_rectangle_size) {
            log::debug!(
                "Refusing {} annotation '{}': geometry below commit threshold",
                annotation.kind(),
                annotation.id
            );
            return false;
        }
        if self.get(&annotation.id).is_some() {
            log::warn!("Refusing annotation with duplicate id '{}'", annotation.id);
            return false;
        }

        log::debug!(
            "➕ Added {} annotation '{}' ({})",
            annotation.kind(),
            annotation.id,
            annotation.category
        );
        self.annotations.push(annotation);
        self.record();
        true
    }

    /// Apply a partial update to the annotation with `id`.
    ///
    /// A shape patch must keep the annotation type and stay committable.
    /// Unknown ids and empty patches are no-ops.
    pub fn update(&mut self, id: &str, patch: AnnotationPatch) -> bool {
        if patch.is_empty() {
            return false;
        }
        let min_size = self.min_rectangle_size;
        let Some(ann) = self.annotations.iter_mut().find(|ann| ann.id == id) else {
            log::debug!("Update ignored: no annotation '{}'", id);
            return false;
        };

        if let Some(shape) = &patch.shape {
            if shape.kind() != ann.kind() || !shape.is_committable(min_size) {
                log::debug!(
                    "Update ignored: {} shape not applicable to {} annotation '{}'",
                    shape.kind(),
                    ann.kind(),
                    id
                );
                return false;
            }
        }

        if let Some(category) = patch.category {
            ann.category = category;
        }
        if let Some(shape) = patch.shape {
            ann.shape = shape;
        }
        if let Some(properties) = patch.properties {
            ann.properties = properties;
        }
        ann.updated_at = clock::now_iso8601();

        log::debug!("✏️ Updated annotation '{}'", id);
        self.record();
        true
    }

    /// Remove the annotation with `id`, clearing the selection if it was selected.
    pub fn delete(&mut self, id: &str) -> Option<Annotation> {
        let index = self.annotations.iter().position(|ann| ann.id == id)?;
        let removed = self.annotations.remove(index);
        if self.selected.as_deref() == Some(id) {
            self.selected = None;
        }

        log::debug!("🗑️ Deleted annotation '{}'", id);
        self.record();
        Some(removed)
    }

    /// Remove every annotation (all images).
    pub fn clear(&mut self) {
        log::debug!("🗑️ Cleared {} annotations", self.annotations.len());
        self.annotations.clear();
        self.selected = None;
        self.record();
    }

    /// Replace the annotations of one image with a freshly loaded list.
    ///
    /// Records for other images and geometry below the commit threshold are
    /// skipped. Returns the number of annotations kept.
    pub fn replace_image_annotations(&mut self, image_id: &str, loaded: Vec<Annotation>) -> usize {
        self.annotations.retain(|ann| ann.image_id != image_id);

        let mut kept = 0;
        for ann in loaded {
            if ann.image_id != image_id {
                log::warn!(
                    "Skipping loaded annotation '{}': belongs to image '{}', not '{}'",
                    ann.id,
                    ann.image_id,
                    image_id
                );
                continue;
            }
            if !ann.shape.is_committable(self.min_rectangle_size) {
                log::debug!("Skipping loaded annotation '{}': invalid geometry", ann.id);
                continue;
            }
            if self.get(&ann.id).is_some() {
                log::warn!("Skipping loaded annotation '{}': duplicate id", ann.id);
                continue;
            }
            self.annotations.push(ann);
            kept += 1;
        }

        if let Some(selected) = self.selected.clone() {
            if self.get(&selected).is_none() {
                self.selected = None;
            }
        }

        log::info!("Loaded {} annotations for image '{}'", kept, image_id);
        self.record();
        kept
    }

    // ========================================================================
    // Selection
    // ========================================================================

    /// Select an annotation by id, or clear the selection with `None`.
    ///
    /// Selecting an unknown id clears the selection. Never touches history.
    pub fn select(&mut self, id: Option<&str>) -> bool {
        self.selected = id
            .filter(|id| self.get(id).is_some())
            .map(str::to_string);
        self.selected.is_some()
    }

    pub fn selected_id(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn selected(&self) -> Option<&Annotation> {
        self.selected.as_deref().and_then(|id| self.get(id))
    }

    // ========================================================================
    // History
    // ========================================================================

    /// Restore the previous snapshot. Clears the selection.
    pub fn undo(&mut self) -> bool {
        let Some(snapshot) = self.history.undo() else {
            return false;
        };
        log::debug!(
            "⏪ Undo: {} annotations (step {}/{})",
            snapshot.len(),
            self.history.cursor() + 1,
            self.history.len()
        );
        self.annotations = snapshot;
        self.selected = None;
        true
    }

    /// Re-apply the next snapshot. Clears the selection.
    pub fn redo(&mut self) -> bool {
        let Some(snapshot) = self.history.redo() else {
            return false;
        };
        log::debug!(
            "⏩ Redo: {} annotations (step {}/{})",
            snapshot.len(),
            self.history.cursor() + 1,
            self.history.len()
        );
        self.annotations = snapshot;
        self.selected = None;
        true
    }

    /// Forget all history; the current set becomes the only snapshot.
    pub fn reset_history(&mut self) {
        self.history.reset(self.annotations.clone());
        log::debug!("History reset");
    }

    fn record(&mut self) {
        self.history.push(self.annotations.clone());
    }
}
