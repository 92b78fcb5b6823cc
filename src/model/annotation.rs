//! Annotation records and their geometry.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::constants::{MIN_POLYGON_VERTICES, MIN_RECTANGLE_SIZE};
use crate::geometry::{Point, Rect, point_in_polygon, polygon_bbox};

/// Unique, opaque annotation identifier.
pub type AnnotationId = String;

/// Annotation kinds, serialized in lowercase (`"rectangle"`, `"polygon"`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnnotationType {
    Rectangle,
    Polygon,
    Point,
    Keypoint,
    Classification,
}

impl AnnotationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnnotationType::Rectangle => "rectangle",
            AnnotationType::Polygon => "polygon",
            AnnotationType::Point => "point",
            AnnotationType::Keypoint => "keypoint",
            AnnotationType::Classification => "classification",
        }
    }
}

impl fmt::Display for AnnotationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Geometry of an annotation, keyed by annotation type.
///
/// The variant *is* the type: a rectangle can never carry polygon vertices.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    /// Axis-aligned box, top-left corner plus size.
    Rectangle(Rect),
    /// Ordered vertices; insertion order defines edge order.
    Polygon(Vec<Point>),
    Point(Point),
    Keypoint(Point),
    /// Whole-image label without geometry.
    Classification,
}

impl Shape {
    pub fn kind(&self) -> AnnotationType {
        match self {
            Shape::Rectangle(_) => AnnotationType::Rectangle,
            Shape::Polygon(_) => AnnotationType::Polygon,
            Shape::Point(_) => AnnotationType::Point,
            Shape::Keypoint(_) => AnnotationType::Keypoint,
            Shape::Classification => AnnotationType::Classification,
        }
    }

    /// Hit predicate used for selection.
    ///
    /// `point_radius` is the click tolerance for point and keypoint shapes,
    /// in canvas units. Classifications have no extent and never match.
    pub fn contains(&self, point: Point, point_radius: f32) -> bool {
        match self {
            Shape::Rectangle(rect) => rect.contains(point),
            Shape::Polygon(vertices) => point_in_polygon(point, vertices),
            Shape::Point(p) | Shape::Keypoint(p) => p.distance_to(&point) <= point_radius,
            Shape::Classification => false,
        }
    }

    /// Whether the geometry is large enough to be committed.
    pub fn is_committable(&self, min_rectangle_size: f32) -> bool {
        match self {
            Shape::Rectangle(rect) => {
                rect.width > min_rectangle_size && rect.height > min_rectangle_size
            }
            Shape::Polygon(vertices) => vertices.len() >= MIN_POLYGON_VERTICES,
            Shape::Point(_) | Shape::Keypoint(_) | Shape::Classification => true,
        }
    }

    /// [`Shape::is_committable`] with the default minimum rectangle size.
    pub fn is_valid(&self) -> bool {
        self.is_committable(MIN_RECTANGLE_SIZE)
    }

    /// Axis-aligned extent of the shape, if it has one.
    pub fn bounding_box(&self) -> Option<Rect> {
        match self {
            Shape::Rectangle(rect) => Some(*rect),
            Shape::Polygon(vertices) => polygon_bbox(vertices),
            Shape::Point(p) | Shape::Keypoint(p) => Some(Rect::new(p.x, p.y, 0.0, 0.0)),
            Shape::Classification => None,
        }
    }
}

/// A single labeled region on an image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "AnnotationRecord", into = "AnnotationRecord")]
pub struct Annotation {
    pub id: AnnotationId,
    /// Image this annotation belongs to (reference only).
    pub image_id: String,
    /// Category *name*, resolved against the project categories when needed.
    pub category: String,
    pub shape: Shape,
    /// Free-form extra attributes.
    pub properties: Map<String, Value>,
    pub created_at: String,
    pub updated_at: String,
}

impl Annotation {
    /// Create an annotation stamped with `timestamp` for both creation and update.
    pub fn new(
        id: impl Into<AnnotationId>,
        image_id: impl Into<String>,
        category: impl Into<String>,
        shape: Shape,
        timestamp: impl Into<String>,
    ) -> Self {
        let timestamp = timestamp.into();
        Self {
            id: id.into(),
            image_id: image_id.into(),
            category: category.into(),
            shape,
            properties: Map::new(),
            created_at: timestamp.clone(),
            updated_at: timestamp,
        }
    }

    pub fn kind(&self) -> AnnotationType {
        self.shape.kind()
    }

    /// Add a property to the annotation.
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }
}

/// Partial update applied by [`AnnotationStore::update`](crate::store::AnnotationStore::update).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnnotationPatch {
    pub category: Option<String>,
    pub shape: Option<Shape>,
    pub properties: Option<Map<String, Value>>,
}

impl AnnotationPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn shape(mut self, shape: Shape) -> Self {
        self.shape = Some(shape);
        self
    }

    pub fn properties(mut self, properties: Map<String, Value>) -> Self {
        self.properties = Some(properties);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.category.is_none() && self.shape.is_none() && self.properties.is_none()
    }
}

/// Errors raised while reading annotation records.
#[derive(Error, Debug)]
pub enum ModelError {
    /// The `coordinates` object lacks the fields its `type` requires
    #[error("annotation '{id}': coordinates do not match type '{kind}'")]
    CoordinatesMismatch {
        /// Offending annotation id
        id: String,
        /// Declared annotation type
        kind: AnnotationType,
    },
}

// Wire representation: `type` plus an all-optional `coordinates` object.

#[derive(Debug, Clone, Serialize, Deserialize)]
struct AnnotationRecord {
    id: String,
    image_id: String,
    #[serde(rename = "type")]
    kind: AnnotationType,
    category: String,
    #[serde(default)]
    coordinates: CoordinatesRecord,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    properties: Map<String, Value>,
    #[serde(default)]
    created_at: String,
    #[serde(default)]
    updated_at: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct CoordinatesRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    x: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    y: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    width: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    height: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    points: Option<Vec<Point>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    point: Option<Point>,
}

impl From<&Shape> for CoordinatesRecord {
    fn from(shape: &Shape) -> Self {
        match shape {
            Shape::Rectangle(rect) => Self {
                x: Some(rect.x),
                y: Some(rect.y),
                width: Some(rect.width),
                height: Some(rect.height),
                ..Default::default()
            },
            Shape::Polygon(points) => Self {
                points: Some(points.clone()),
                ..Default::default()
            },
            Shape::Point(p) | Shape::Keypoint(p) => Self {
                point: Some(*p),
                ..Default::default()
            },
            Shape::Classification => Self::default(),
        }
    }
}

impl From<Annotation> for AnnotationRecord {
    fn from(ann: Annotation) -> Self {
        Self {
            kind: ann.shape.kind(),
            coordinates: CoordinatesRecord::from(&ann.shape),
            id: ann.id,
            image_id: ann.image_id,
            category: ann.category,
            properties: ann.properties,
            created_at: ann.created_at,
            updated_at: ann.updated_at,
        }
    }
}

impl TryFrom<AnnotationRecord> for Annotation {
    type Error = ModelError;

    fn try_from(record: AnnotationRecord) -> Result<Self, Self::Error> {
        let c = record.coordinates;
        let shape = match record.kind {
            AnnotationType::Rectangle => match (c.x, c.y, c.width, c.height) {
                (Some(x), Some(y), Some(width), Some(height)) => {
                    Some(Shape::Rectangle(Rect::new(x, y, width, height)))
                }
                _ => None,
            },
            AnnotationType::Polygon => c.points.map(Shape::Polygon),
            AnnotationType::Point => c.point.map(Shape::Point),
            AnnotationType::Keypoint => c.point.map(Shape::Keypoint),
            AnnotationType::Classification => Some(Shape::Classification),
        };

        let Some(shape) = shape else {
            return Err(ModelError::CoordinatesMismatch {
                id: record.id,
                kind: record.kind,
            });
        };

        Ok(Self {
            id: record.id,
            image_id: record.image_id,
            category: record.category,
            shape,
            properties: record.properties,
            created_at: record.created_at,
            updated_at: record.updated_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rect(x: f32, y: f32, w: f32, h: f32) -> Shape {
        Shape::Rectangle(Rect::new(x, y, w, h))
    }

    #[test]
    fn test_rectangle_wire_format() {
        let ann = Annotation::new("a1", "img1", "car", rect(10.0, 20.0, 30.0, 40.0), "t0");
        let value = serde_json::to_value(&ann).unwrap();
        assert_eq!(
            value,
            json!({
                "id": "a1",
                "image_id": "img1",
                "type": "rectangle",
                "category": "car",
                "coordinates": {"x": 10.0, "y": 20.0, "width": 30.0, "height": 40.0},
                "created_at": "t0",
                "updated_at": "t0"
            })
        );
    }

    #[test]
    fn test_polygon_and_point_wire_format() {
        let poly = Annotation::new(
            "p",
            "img",
            "roof",
            Shape::Polygon(vec![Point::new(0.0, 0.0), Point::new(1.0, 0.0), Point::new(0.0, 1.0)]),
            "t",
        );
        let value = serde_json::to_value(&poly).unwrap();
        assert_eq!(value["type"], "polygon");
        assert_eq!(value["coordinates"]["points"][1], json!({"x": 1.0, "y": 0.0}));
        assert!(value["coordinates"].get("x").is_none());

        let kp = Annotation::new("k", "img", "eye", Shape::Keypoint(Point::new(3.0, 4.0)), "t");
        let value = serde_json::to_value(&kp).unwrap();
        assert_eq!(value["type"], "keypoint");
        assert_eq!(value["coordinates"], json!({"point": {"x": 3.0, "y": 4.0}}));
    }

    #[test]
    fn test_deserialize_rejects_mismatched_coordinates() {
        let raw = json!({
            "id": "bad",
            "image_id": "img",
            "type": "rectangle",
            "category": "car",
            "coordinates": {"points": [{"x": 0.0, "y": 0.0}]}
        });
        let err = serde_json::from_value::<Annotation>(raw).unwrap_err();
        assert!(err.to_string().contains("do not match type 'rectangle'"));
    }

    #[test]
    fn test_deserialize_with_properties() {
        let raw = json!({
            "id": "p1",
            "image_id": "img",
            "type": "point",
            "category": "nose",
            "coordinates": {"point": {"x": 1.5, "y": 2.5}},
            "properties": {"visible": true},
            "created_at": "2024-01-01T00:00:00.000Z",
            "updated_at": "2024-01-01T00:00:00.000Z"
        });
        let ann: Annotation = serde_json::from_value(raw).unwrap();
        assert_eq!(ann.shape, Shape::Point(Point::new(1.5, 2.5)));
        assert_eq!(ann.properties.get("visible"), Some(&Value::Bool(true)));
    }

    #[test]
    fn test_committable_thresholds() {
        assert!(!rect(0.0, 0.0, 4.0, 10.0).is_valid());
        assert!(!rect(0.0, 0.0, 5.0, 5.0).is_valid());
        assert!(rect(0.0, 0.0, 6.0, 6.0).is_valid());

        let two = Shape::Polygon(vec![Point::new(0.0, 0.0), Point::new(1.0, 1.0)]);
        assert!(!two.is_valid());
        assert!(Shape::Point(Point::new(0.0, 0.0)).is_valid());
    }

    #[test]
    fn test_point_tolerance_is_inclusive() {
        let shape = Shape::Point(Point::new(0.0, 0.0));
        assert!(shape.contains(Point::new(10.0, 0.0), 10.0));
        assert!(!shape.contains(Point::new(10.1, 0.0), 10.0));
        assert!(!Shape::Classification.contains(Point::new(0.0, 0.0), 10.0));
    }
}
