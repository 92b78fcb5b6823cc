//! Native JSON format.
//!
//! `{project, images, annotations}` written verbatim and pretty-printed.
//! This is the only lossless format.

use serde::{Deserialize, Serialize};

use crate::format::dataset::{Dataset, DatasetView};
use crate::format::error::FormatError;
use crate::format::traits::AnnotationFormat;
use crate::model::{Annotation, ImageInfo, ProjectInfo};

/// Native JSON format.
///
/// Supports every annotation type, properties and timestamps.
pub struct JsonFormat;

impl AnnotationFormat for JsonFormat {
    fn id(&self) -> &'static str {
        "json"
    }

    fn display_name(&self) -> &'static str {
        "Annotation JSON"
    }

    fn extensions(&self) -> &[&'static str] {
        &["json"]
    }

    fn supports_polygon(&self) -> bool {
        true
    }

    fn supports_point(&self) -> bool {
        true
    }

    fn export(&self, data: &DatasetView<'_>) -> Result<String, FormatError> {
        let doc = JsonDocumentRef {
            project: data.project,
            images: data.images,
            annotations: data.annotations,
        };
        let json = serde_json::to_string_pretty(&doc)?;

        log::info!(
            "Exported {} images with {} annotations as JSON",
            data.images.len(),
            data.annotations.len()
        );
        Ok(json)
    }

    fn import(&self, content: &str, _images: &[ImageInfo]) -> Result<Dataset, FormatError> {
        let doc: JsonDocument = serde_json::from_str(content)?;
        let annotations = doc
            .annotations
            .ok_or_else(|| FormatError::missing_field("annotations"))?;

        log::info!("Imported {} annotations from JSON", annotations.len());
        Ok(Dataset {
            project: doc.project,
            images: doc.images.unwrap_or_default(),
            annotations,
        })
    }
}

#[derive(Serialize)]
struct JsonDocumentRef<'a> {
    project: Option<&'a ProjectInfo>,
    images: &'a [ImageInfo],
    annotations: &'a [Annotation],
}

#[derive(Deserialize)]
struct JsonDocument {
    #[serde(default)]
    project: Option<ProjectInfo>,
    #[serde(default)]
    images: Option<Vec<ImageInfo>>,
    #[serde(default)]
    annotations: Option<Vec<Annotation>>,
}
