//! Annotation dataset import/export.
//!
//! Serializers are pure functions of (annotations, project metadata, image
//! metadata). They are reached through the [`AnnotationFormat`] trait, either
//! directly or via the [`FormatRegistry`].
//!
//! ## Supported Formats
//!
//! - **JSON**: `{project, images, annotations}`, lossless
//! - **COCO JSON**: rectangles and polygons only
//! - **Pascal VOC**: rectangles only, as JSON records or XML documents
//!
//! COCO and VOC drop the annotation types they cannot express without
//! reporting an error.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use canvas_annotator::format::{DatasetView, ExportFormat};
//!
//! let view = DatasetView::new(Some(&project), &images, store.annotations());
//! let coco = ExportFormat::Coco.export(&view)?;
//! ```

mod dataset;
mod error;
pub mod formats;
mod registry;
mod traits;

use std::fmt;
use std::str::FromStr;

pub use dataset::{Dataset, DatasetView};
pub use error::FormatError;
pub use formats::{VocDocument, VocRecord};
pub use registry::FormatRegistry;
pub use traits::AnnotationFormat;

use crate::model::ImageInfo;

/// The export formats a session can produce as a single document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExportFormat {
    Json,
    Coco,
    Voc,
}

impl ExportFormat {
    pub fn all() -> [ExportFormat; 3] {
        [ExportFormat::Json, ExportFormat::Coco, ExportFormat::Voc]
    }

    /// Registry id of the format.
    pub fn id(&self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Coco => "coco",
            ExportFormat::Voc => "voc",
        }
    }

    fn format(&self) -> &'static dyn AnnotationFormat {
        match self {
            ExportFormat::Json => &formats::JsonFormat,
            ExportFormat::Coco => &formats::CocoFormat,
            ExportFormat::Voc => &formats::PascalVocFormat,
        }
    }

    /// Serialize `data` in this format.
    pub fn export(&self, data: &DatasetView<'_>) -> Result<String, FormatError> {
        self.format().export(data)
    }

    /// Parse a document in this format.
    pub fn import(&self, content: &str, images: &[ImageInfo]) -> Result<Dataset, FormatError> {
        self.format().import(content, images)
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for ExportFormat {
    type Err = FormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ExportFormat::all()
            .into_iter()
            .find(|format| format.id().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| FormatError::UnknownFormat(s.to_string()))
    }
}
