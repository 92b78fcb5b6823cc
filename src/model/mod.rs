//! Data models for the annotation editor.

mod annotation;
mod category;
mod project;

pub use annotation::{
    Annotation, AnnotationId, AnnotationPatch, AnnotationType, ModelError, Shape,
};
pub use category::{Category, color_for};
pub use project::{ImageInfo, ProjectContext, ProjectInfo};
