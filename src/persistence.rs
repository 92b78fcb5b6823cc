//! Persistence collaborator for annotation data.
//!
//! The session talks to storage only through [`AnnotationRepository`]. Two
//! implementations ship with the crate: an in-memory map for tests and
//! embedding, and a directory of JSON files for the native binary.
//!
//! ## Directory layout
//!
//! ```text
//! <root>/
//!   annotations/<image_id>.json   {"annotations": [...]}
//!   exports/<name>
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::Annotation;

/// Errors raised by repositories.
#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("No stored annotations for image '{0}'")]
    NotFound(String),

    /// Ids are used as file names and must not contain path components
    #[error("Invalid storage key '{0}'")]
    InvalidKey(String),
}

/// Storage for per-image annotation lists and export documents.
pub trait AnnotationRepository {
    /// Replace the stored annotations of `image_id`.
    fn save_annotations(
        &mut self,
        image_id: &str,
        annotations: &[Annotation],
    ) -> Result<(), PersistenceError>;

    /// Stored annotations of `image_id`.
    fn load_annotations(&self, image_id: &str) -> Result<Vec<Annotation>, PersistenceError>;

    /// Store an export document under `name`.
    fn save_export(&mut self, name: &str, content: &str) -> Result<(), PersistenceError>;
}

/// Body of a stored annotation file.
#[derive(Serialize, Deserialize)]
struct AnnotationFile {
    annotations: Vec<Annotation>,
}

#[derive(Serialize)]
struct AnnotationFileRef<'a> {
    annotations: &'a [Annotation],
}

/// In-memory repository.
#[derive(Debug, Clone, Default)]
pub struct MemoryRepository {
    annotations: HashMap<String, Vec<Annotation>>,
    exports: HashMap<String, String>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn export(&self, name: &str) -> Option<&str> {
        self.exports.get(name).map(String::as_str)
    }

    /// Number of images with stored annotations.
    pub fn image_count(&self) -> usize {
        self.annotations.len()
    }
}

impl AnnotationRepository for MemoryRepository {
    fn save_annotations(
        &mut self,
        image_id: &str,
        annotations: &[Annotation],
    ) -> Result<(), PersistenceError> {
        self.annotations
            .insert(image_id.to_string(), annotations.to_vec());
        Ok(())
    }

    fn load_annotations(&self, image_id: &str) -> Result<Vec<Annotation>, PersistenceError> {
        self.annotations
            .get(image_id)
            .cloned()
            .ok_or_else(|| PersistenceError::NotFound(image_id.to_string()))
    }

    fn save_export(&mut self, name: &str, content: &str) -> Result<(), PersistenceError> {
        self.exports.insert(name.to_string(), content.to_string());
        Ok(())
    }
}

/// Repository backed by a directory of JSON files.
#[derive(Debug, Clone)]
pub struct JsonDirRepository {
    root: PathBuf,
}

impl JsonDirRepository {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn annotation_path(&self, image_id: &str) -> Result<PathBuf, PersistenceError> {
        Ok(self
            .root
            .join("annotations")
            .join(format!("{}.json", checked_key(image_id)?)))
    }

    /// Path an export called `name` is written to.
    pub fn export_path(&self, name: &str) -> Result<PathBuf, PersistenceError> {
        Ok(self.root.join("exports").join(checked_key(name)?))
    }
}

fn checked_key(key: &str) -> Result<&str, PersistenceError> {
    let valid = !key.is_empty()
        && key != "."
        && key != ".."
        && !key.contains(['/', '\\', '\0']);
    if valid {
        Ok(key)
    } else {
        Err(PersistenceError::InvalidKey(key.to_string()))
    }
}

fn write_file(path: &Path, content: &str) -> Result<(), PersistenceError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, content)?;
    Ok(())
}

impl AnnotationRepository for JsonDirRepository {
    fn save_annotations(
        &mut self,
        image_id: &str,
        annotations: &[Annotation],
    ) -> Result<(), PersistenceError> {
        let path = self.annotation_path(image_id)?;
        let json = serde_json::to_string_pretty(&AnnotationFileRef { annotations })?;
        write_file(&path, &json)?;
        log::debug!(
            "Saved {} annotations for image '{}' to {:?}",
            annotations.len(),
            image_id,
            path
        );
        Ok(())
    }

    fn load_annotations(&self, image_id: &str) -> Result<Vec<Annotation>, PersistenceError> {
        let path = self.annotation_path(image_id)?;
        if !path.exists() {
            return Err(PersistenceError::NotFound(image_id.to_string()));
        }
        let json = std::fs::read_to_string(&path)?;
        let file: AnnotationFile = serde_json::from_str(&json)?;
        log::debug!(
            "Loaded {} annotations for image '{}' from {:?}",
            file.annotations.len(),
            image_id,
            path
        );
        Ok(file.annotations)
    }

    fn save_export(&mut self, name: &str, content: &str) -> Result<(), PersistenceError> {
        let path = self.export_path(name)?;
        write_file(&path, content)?;
        log::info!("Wrote export {:?}", path);
        Ok(())
    }
}
