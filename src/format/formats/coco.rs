//! COCO JSON format implementation.
//!
//! Export is deliberately lossy: only rectangles (`bbox`) and polygons
//! (`segmentation`) are written. Points, keypoints and classifications are
//! skipped, although their categories are still registered.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::clock;
use crate::format::dataset::{Dataset, DatasetView};
use crate::format::error::FormatError;
use crate::format::traits::AnnotationFormat;
use crate::geometry::{Point, Rect, polygon_area, polygon_bbox};
use crate::model::{Annotation, ImageInfo, Shape};

/// Description used when the project has none.
const DEFAULT_DESCRIPTION: &str = "Annotation dataset";
const CONTRIBUTOR: &str = "Annotation System";
const LICENSE_ID: u32 = 1;

/// COCO JSON format.
///
/// Supports:
/// - Bounding boxes (bbox, area = w*h)
/// - Polygons (flattened segmentation, shoelace area, extent bbox)
///
/// Does not support:
/// - Points and keypoints (silently omitted)
/// - Classifications
pub struct CocoFormat;

impl AnnotationFormat for CocoFormat {
    fn id(&self) -> &'static str {
        "coco"
    }

    fn display_name(&self) -> &'static str {
        "COCO (JSON)"
    }

    fn extensions(&self) -> &[&'static str] {
        &["json"]
    }

    fn supports_polygon(&self) -> bool {
        true
    }

    fn supports_point(&self) -> bool {
        false
    }

    fn export(&self, data: &DatasetView<'_>) -> Result<String, FormatError> {
        let description = data
            .project
            .and_then(|p| p.description.as_deref())
            .filter(|d| !d.is_empty())
            .unwrap_or(DEFAULT_DESCRIPTION);

        let mut coco = CocoDataset {
            info: CocoInfo {
                description: description.to_string(),
                version: "1.0".into(),
                year: clock::current_year(),
                contributor: CONTRIBUTOR.into(),
                date_created: clock::now_iso8601(),
            },
            licenses: vec![CocoLicense {
                id: LICENSE_ID,
                name: "Unknown License".into(),
                url: String::new(),
            }],
            images: data
                .images
                .iter()
                .enumerate()
                .map(|(idx, img)| CocoImage {
                    id: (idx + 1) as u64,
                    width: img.width,
                    height: img.height,
                    file_name: img.filename.clone(),
                    license: LICENSE_ID,
                    flickr_url: String::new(),
                    coco_url: String::new(),
                    date_captured: img.created_at.clone(),
                })
                .collect(),
            categories: Vec::new(),
            annotations: Vec::new(),
        };

        // Category ids in first-seen order over every annotation, including
        // the types that are omitted below.
        let mut category_ids: HashMap<&str, u32> = HashMap::new();
        for ann in data.annotations {
            if !category_ids.contains_key(ann.category.as_str()) {
                let id = coco.categories.len() as u32 + 1;
                category_ids.insert(&ann.category, id);
                coco.categories.push(CocoCategory {
                    id,
                    name: ann.category.clone(),
                    supercategory: String::new(),
                });
            }
        }

        let mut skipped = 0usize;
        for ann in data.annotations {
            let image_id = match data.image_index(&ann.image_id) {
                Some(idx) => (idx + 1) as u64,
                None => {
                    log::warn!(
                        "COCO export: annotation '{}' references unknown image '{}'",
                        ann.id,
                        ann.image_id
                    );
                    0
                }
            };
            let category_id = category_ids.get(ann.category.as_str()).copied().unwrap_or(0);
            let id = coco.annotations.len() as u64 + 1;

            match convert_annotation(ann, id, image_id, category_id) {
                Some(coco_ann) => coco.annotations.push(coco_ann),
                None => skipped += 1,
            }
        }

        let json = serde_json::to_string_pretty(&coco)?;

        log::info!(
            "Exported {} images with {} annotations as COCO ({} skipped)",
            coco.images.len(),
            coco.annotations.len(),
            skipped
        );
        Ok(json)
    }

    fn import(&self, content: &str, images: &[ImageInfo]) -> Result<Dataset, FormatError> {
        let coco: CocoDataset = serde_json::from_str(content)?;

        // COCO image id -> host image
        let mut image_map: HashMap<u64, ImageInfo> = HashMap::new();
        let mut resolved = Vec::new();
        for (idx, coco_img) in coco.images.iter().enumerate() {
            let image = if images.is_empty() {
                Some(ImageInfo::new(
                    coco_img.id.to_string(),
                    &coco_img.file_name,
                    coco_img.width,
                    coco_img.height,
                ))
            } else {
                images
                    .iter()
                    .find(|img| img.filename == coco_img.file_name)
                    .or_else(|| images.get(idx))
                    .cloned()
            };
            match image {
                Some(image) => {
                    image_map.insert(coco_img.id, image.clone());
                    resolved.push(image);
                }
                None => log::warn!(
                    "COCO import: no image matches '{}' (id {})",
                    coco_img.file_name,
                    coco_img.id
                ),
            }
        }

        let category_names: HashMap<u32, &str> = coco
            .categories
            .iter()
            .map(|c| (c.id, c.name.as_str()))
            .collect();

        let timestamp = clock::now_iso8601();
        let mut annotations = Vec::new();
        for coco_ann in &coco.annotations {
            let Some(image) = image_map.get(&coco_ann.image_id) else {
                log::debug!("COCO import: skipping annotation {} for unknown image", coco_ann.id);
                continue;
            };
            let Some(category) = category_names.get(&coco_ann.category_id) else {
                log::warn!(
                    "COCO import: annotation {} has unknown category {}",
                    coco_ann.id,
                    coco_ann.category_id
                );
                continue;
            };
            let shape = convert_coco_annotation(coco_ann)?;
            annotations.push(Annotation::new(
                format!("coco-{}", coco_ann.id),
                image.id.clone(),
                *category,
                shape,
                timestamp.clone(),
            ));
        }

        log::info!(
            "Imported {} images with {} annotations from COCO",
            resolved.len(),
            annotations.len()
        );
        Ok(Dataset {
            project: None,
            images: resolved,
            annotations,
        })
    }
}

/// Convert an annotation to COCO; `None` for types COCO export omits.
fn convert_annotation(
    ann: &Annotation,
    id: u64,
    image_id: u64,
    category_id: u32,
) -> Option<CocoAnnotation> {
    let (bbox, segmentation, area) = match &ann.shape {
        Shape::Rectangle(rect) => (rect.to_xywh(), None, rect.area()),
        Shape::Polygon(points) => {
            let flat: Vec<f32> = points.iter().flat_map(|p| [p.x, p.y]).collect();
            let bbox = polygon_bbox(points).map(|r| r.to_xywh()).unwrap_or_default();
            (bbox, Some(vec![flat]), polygon_area(points))
        }
        Shape::Point(_) | Shape::Keypoint(_) | Shape::Classification => return None,
    };

    Some(CocoAnnotation {
        id,
        image_id,
        category_id,
        segmentation,
        area,
        bbox: Some(bbox),
        iscrowd: 0,
    })
}

/// Convert a COCO annotation back to a shape.
///
/// A segmentation with at least three vertices wins over the bbox.
fn convert_coco_annotation(ann: &CocoAnnotation) -> Result<Shape, FormatError> {
    if let Some(ring) = ann.segmentation.as_ref().and_then(|seg| seg.first()) {
        if ring.len() >= 6 {
            if ring.len() % 2 != 0 {
                return Err(FormatError::invalid_coordinates(format!(
                    "annotation {}: odd segmentation length {}",
                    ann.id,
                    ring.len()
                )));
            }
            let points = ring
                .chunks_exact(2)
                .map(|pair| Point::new(pair[0], pair[1]))
                .collect();
            return Ok(Shape::Polygon(points));
        }
    }

    match ann.bbox {
        Some([x, y, w, h]) => Ok(Shape::Rectangle(Rect::new(x, y, w, h))),
        None => Err(FormatError::missing_field(format!("annotations[{}].bbox", ann.id))),
    }
}

// COCO format structures

#[derive(Debug, Serialize, Deserialize)]
struct CocoDataset {
    #[serde(default)]
    info: CocoInfo,
    #[serde(default)]
    licenses: Vec<CocoLicense>,
    images: Vec<CocoImage>,
    categories: Vec<CocoCategory>,
    annotations: Vec<CocoAnnotation>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct CocoInfo {
    #[serde(default)]
    description: String,
    #[serde(default)]
    version: String,
    #[serde(default)]
    year: u32,
    #[serde(default)]
    contributor: String,
    #[serde(default)]
    date_created: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct CocoLicense {
    id: u32,
    name: String,
    #[serde(default)]
    url: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct CocoImage {
    id: u64,
    #[serde(default)]
    width: u32,
    #[serde(default)]
    height: u32,
    file_name: String,
    #[serde(default)]
    license: u32,
    #[serde(default)]
    flickr_url: String,
    #[serde(default)]
    coco_url: String,
    #[serde(default)]
    date_captured: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct CocoCategory {
    id: u32,
    name: String,
    #[serde(default)]
    supercategory: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct CocoAnnotation {
    id: u64,
    image_id: u64,
    category_id: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    segmentation: Option<Vec<Vec<f32>>>,
    #[serde(default)]
    area: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    bbox: Option<[f32; 4]>,
    #[serde(default)]
    iscrowd: u8,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_metadata() {
        let format = CocoFormat;
        assert_eq!(format.id(), "coco");
        assert!(format.supports_polygon());
        assert!(!format.supports_point());
    }

    #[test]
    fn test_point_types_are_omitted() {
        let ann = Annotation::new("p", "img", "nose", Shape::Point(Point::new(1.0, 2.0)), "t");
        assert!(convert_annotation(&ann, 1, 1, 1).is_none());
        let ann = Annotation::new("k", "img", "eye", Shape::Keypoint(Point::new(1.0, 2.0)), "t");
        assert!(convert_annotation(&ann, 1, 1, 1).is_none());
    }

    #[test]
    fn test_segmentation_preferred_over_bbox() {
        let ann = CocoAnnotation {
            id: 7,
            image_id: 1,
            category_id: 1,
            segmentation: Some(vec![vec![0.0, 0.0, 4.0, 0.0, 0.0, 3.0]]),
            area: 6.0,
            bbox: Some([0.0, 0.0, 4.0, 3.0]),
            iscrowd: 0,
        };
        let shape = convert_coco_annotation(&ann).unwrap();
        assert_eq!(
            shape,
            Shape::Polygon(vec![Point::new(0.0, 0.0), Point::new(4.0, 0.0), Point::new(0.0, 3.0)])
        );
    }

    #[test]
    fn test_missing_bbox_is_error() {
        let ann = CocoAnnotation {
            id: 3,
            image_id: 1,
            category_id: 1,
            segmentation: None,
            area: 0.0,
            bbox: None,
            iscrowd: 0,
        };
        assert!(matches!(
            convert_coco_annotation(&ann),
            Err(FormatError::MissingField { .. })
        ));
    }
}
