//! Input and output shapes of the serializers.

use crate::model::{Annotation, ImageInfo, ProjectInfo};

/// Borrowed export input: annotations plus host-supplied metadata.
///
/// Missing metadata is allowed; exporters fall back to defaults.
#[derive(Debug, Clone, Copy)]
pub struct DatasetView<'a> {
    pub project: Option<&'a ProjectInfo>,
    pub images: &'a [ImageInfo],
    pub annotations: &'a [Annotation],
}

impl<'a> DatasetView<'a> {
    pub fn new(
        project: Option<&'a ProjectInfo>,
        images: &'a [ImageInfo],
        annotations: &'a [Annotation],
    ) -> Self {
        Self {
            project,
            images,
            annotations,
        }
    }

    /// Position of the image with `image_id` in the supplied image list.
    pub fn image_index(&self, image_id: &str) -> Option<usize> {
        self.images.iter().position(|img| img.id == image_id)
    }

    /// Annotations belonging to `image_id`, in store order.
    pub fn annotations_for<'b>(
        &'b self,
        image_id: &'b str,
    ) -> impl Iterator<Item = &'a Annotation> + 'b {
        self.annotations
            .iter()
            .filter(move |ann| ann.image_id == image_id)
    }
}

/// Owned result of an import.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    pub project: Option<ProjectInfo>,
    pub images: Vec<ImageInfo>,
    pub annotations: Vec<Annotation>,
}

impl Dataset {
    pub fn view(&self) -> DatasetView<'_> {
        DatasetView::new(self.project.as_ref(), &self.images, &self.annotations)
    }

    /// Imported annotations for one image.
    pub fn annotations_for(&self, image_id: &str) -> Vec<Annotation> {
        self.annotations
            .iter()
            .filter(|ann| ann.image_id == image_id)
            .cloned()
            .collect()
    }
}
