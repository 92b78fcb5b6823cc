//! Trait definitions for annotation format implementations.

use crate::format::dataset::{Dataset, DatasetView};
use crate::format::error::FormatError;
use crate::model::{ImageInfo, Shape};

/// Trait for annotation format import/export implementations.
///
/// Exporters are pure: they read a [`DatasetView`] and return the serialized
/// document. They never mutate editor state.
pub trait AnnotationFormat: Send + Sync {
    /// Unique identifier for this format (e.g., "json", "coco", "voc").
    fn id(&self) -> &'static str;

    /// Human-readable name for UI display.
    fn display_name(&self) -> &'static str;

    /// File extensions this format uses.
    fn extensions(&self) -> &[&'static str];

    /// Whether polygon annotations survive an export.
    fn supports_polygon(&self) -> bool;

    /// Whether point and keypoint annotations survive an export.
    fn supports_point(&self) -> bool;

    /// Whether an annotation with `shape` appears in this format's export.
    ///
    /// Classifications have no geometry and survive only in formats that
    /// keep every shape.
    fn keeps(&self, shape: &Shape) -> bool {
        match shape {
            Shape::Rectangle(_) => true,
            Shape::Polygon(_) => self.supports_polygon(),
            Shape::Point(_) | Shape::Keypoint(_) => self.supports_point(),
            Shape::Classification => self.supports_polygon() && self.supports_point(),
        }
    }

    /// Serialize the dataset.
    fn export(&self, data: &DatasetView<'_>) -> Result<String, FormatError>;

    /// Parse a document produced by [`AnnotationFormat::export`] (or a
    /// compatible tool).
    ///
    /// `images` are the host's known images; imported records are matched
    /// against them where the format has no stable image id.
    fn import(&self, content: &str, images: &[ImageInfo]) -> Result<Dataset, FormatError>;
}
