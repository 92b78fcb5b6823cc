#![expect(dead_code, reason = "each test binary uses a different subset of helpers")]

use canvas_annotator::geometry::{Point, Rect};
use canvas_annotator::model::{Annotation, ImageInfo, Shape};
use canvas_annotator::viewport::{CanvasBounds, Viewport};
use proptest::prelude::*;
use proptest::test_runner::{Config as ProptestConfig, FileFailurePersistence};

pub const TIMESTAMP: &str = "2024-01-01T00:00:00.000Z";

pub fn proptest_config() -> ProptestConfig {
    let cases = std::env::var("PROPTEST_CASES")
        .ok()
        .and_then(|v| v.parse::<u32>().ok())
        .unwrap_or(64);

    let mut config = ProptestConfig::with_failure_persistence(FileFailurePersistence::WithSource(
        "proptest-regressions",
    ));
    config.cases = cases;
    config.max_shrink_iters = 1024;
    config
}

/// Scale inside the zoom limits, offsets anywhere on a large desk.
pub fn arb_viewport() -> impl Strategy<Value = Viewport> {
    (0.1f32..=5.0, -1000.0f32..1000.0, -1000.0f32..1000.0)
        .prop_map(|(scale, x, y)| Viewport::new(scale, x, y))
}

pub fn arb_bounds() -> impl Strategy<Value = CanvasBounds> {
    (0.0f32..500.0, 0.0f32..500.0, 100.0f32..1920.0, 100.0f32..1080.0)
        .prop_map(|(left, top, w, h)| CanvasBounds::new(left, top, w, h))
}

/// Rectangles comfortably above the commit threshold.
pub fn arb_rect() -> impl Strategy<Value = Rect> {
    (0.0f32..1000.0, 0.0f32..1000.0, 6.0f32..400.0, 6.0f32..400.0)
        .prop_map(|(x, y, w, h)| Rect::new(x, y, w, h))
}

pub fn arb_polygon() -> impl Strategy<Value = Vec<Point>> {
    prop::collection::vec(
        (0.0f32..1000.0, 0.0f32..1000.0).prop_map(|(x, y)| Point::new(x, y)),
        3..8,
    )
}

pub fn arb_category() -> impl Strategy<Value = String> {
    prop::sample::select(vec!["car", "person", "tree", "sign", "dog"]).prop_map(str::to_string)
}

/// Rectangles and polygons: the shapes every export format carries.
pub fn arb_area_shape() -> impl Strategy<Value = Shape> {
    prop_oneof![
        arb_rect().prop_map(Shape::Rectangle),
        arb_polygon().prop_map(Shape::Polygon),
    ]
}

pub fn arb_any_shape() -> impl Strategy<Value = Shape> {
    prop_oneof![
        3 => arb_area_shape(),
        1 => (0.0f32..1000.0, 0.0f32..1000.0).prop_map(|(x, y)| Shape::Point(Point::new(x, y))),
        1 => (0.0f32..1000.0, 0.0f32..1000.0).prop_map(|(x, y)| Shape::Keypoint(Point::new(x, y))),
    ]
}

pub fn images(count: usize) -> Vec<ImageInfo> {
    (0..count)
        .map(|i| ImageInfo::new(format!("img-{}", i), format!("frame_{:03}.jpg", i), 1280, 720))
        .collect()
}

/// Annotations spread over `image_count` images.
pub fn arb_annotations(
    image_count: usize,
    max_annotations: usize,
    shape: impl Strategy<Value = Shape>,
) -> impl Strategy<Value = Vec<Annotation>> {
    prop::collection::vec((0..image_count, arb_category(), shape), 0..=max_annotations).prop_map(
        |entries| {
            entries
                .into_iter()
                .enumerate()
                .map(|(i, (image, category, shape))| {
                    Annotation::new(format!("a{}", i), format!("img-{}", image), category, shape, TIMESTAMP)
                })
                .collect()
        },
    )
}

pub fn approx_eq(a: f32, b: f32, eps: f32) -> bool {
    (a - b).abs() <= eps
}
