//! Unit tests for annotation format implementations.
//!
//! These tests verify the correctness of format serialization, deserialization,
//! and round-trip conversions.


use crate::format::Dataset;
use crate::geometry::{Point, Rect};
use crate::model::{Annotation, ImageInfo, ProjectInfo, Shape};

const TS: &str = "2024-03-01T12:00:00.000Z";

fn ann(id: &str, image: &str, category: &str, shape: Shape) -> Annotation {
    Annotation::new(id, image, category, shape, TS)
}

/// Three images (the last unannotated) with every annotation type.
fn sample_dataset() -> Dataset {
    let mut scene1 = ImageInfo::new("img-a", "scene1.jpg", 1920, 1080).with_url("/uploads/scene1.jpg");
    scene1.created_at = "2024-01-01T00:00:00.000Z".into();

    Dataset {
        project: Some(ProjectInfo::new("p1", "Street Scenes").with_description("City streets")),
        images: vec![
            scene1,
            ImageInfo::new("img-b", "scene2.jpg", 640, 480),
            ImageInfo::new("img-c", "empty.jpg", 320, 240),
        ],
        annotations: vec![
            ann("r1", "img-a", "car", Shape::Rectangle(Rect::new(100.0, 200.0, 150.0, 300.0))),
            ann("pt1", "img-a", "person", Shape::Point(Point::new(960.0, 540.0))),
            ann(
                "poly1",
                "img-a",
                "building",
                Shape::Polygon(vec![
                    Point::new(0.0, 0.0),
                    Point::new(10.0, 0.0),
                    Point::new(10.0, 10.0),
                    Point::new(0.0, 10.0),
                ]),
            ),
            ann("r2", "img-b", "car", Shape::Rectangle(Rect::new(10.0, 20.0, 30.0, 40.0))),
            ann("kp1", "img-b", "eye", Shape::Keypoint(Point::new(5.0, 5.0))),
        ],
    }
}
