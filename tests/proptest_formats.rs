use std::collections::{BTreeMap, BTreeSet};

use canvas_annotator::format::formats::build_records;
use canvas_annotator::format::{DatasetView, ExportFormat};
use canvas_annotator::model::{AnnotationType, Shape};
use proptest::prelude::*;
use serde_json::Value;

mod proptest_helpers;

use proptest_helpers::{arb_annotations, arb_any_shape, arb_area_shape, images};

proptest! {
    #![proptest_config(proptest_helpers::proptest_config())]

    #[test]
    fn coco_roundtrip_preserves_areas(annotations in arb_annotations(4, 20, arb_area_shape())) {
        let images = images(4);
        let view = DatasetView::new(None, &images, &annotations);

        let json = ExportFormat::Coco.export(&view).expect("serialize coco");
        let restored = ExportFormat::Coco.import(&json, &images).expect("parse coco");

        prop_assert_eq!(restored.annotations.len(), annotations.len());
        for (got, want) in restored.annotations.iter().zip(&annotations) {
            prop_assert_eq!(&got.image_id, &want.image_id);
            prop_assert_eq!(&got.category, &want.category);
            prop_assert_eq!(&got.shape, &want.shape);
        }
    }

    #[test]
    fn coco_category_ids_are_stable_and_injective(annotations in arb_annotations(3, 30, arb_any_shape())) {
        let images = images(3);
        let view = DatasetView::new(None, &images, &annotations);
        let coco: Value = serde_json::from_str(&ExportFormat::Coco.export(&view).expect("serialize"))
            .expect("valid json");

        let mut by_name: BTreeMap<String, u64> = BTreeMap::new();
        for cat in coco["categories"].as_array().expect("categories") {
            let name = cat["name"].as_str().expect("name").to_string();
            let id = cat["id"].as_u64().expect("id");
            prop_assert!(by_name.insert(name, id).is_none(), "name listed twice");
        }
        let ids: BTreeSet<u64> = by_name.values().copied().collect();
        prop_assert_eq!(ids.len(), by_name.len());

        let names: BTreeSet<&str> = annotations.iter().map(|a| a.category.as_str()).collect();
        prop_assert_eq!(names.len(), by_name.len());

        // Exported annotations point at the id of their own category.
        let exported: Vec<_> = annotations
            .iter()
            .filter(|a| matches!(a.kind(), AnnotationType::Rectangle | AnnotationType::Polygon))
            .collect();
        let coco_anns = coco["annotations"].as_array().expect("annotations");
        prop_assert_eq!(coco_anns.len(), exported.len());
        for (coco_ann, ann) in coco_anns.iter().zip(exported) {
            prop_assert_eq!(coco_ann["category_id"].as_u64(), by_name.get(&ann.category).copied());
        }
    }

    #[test]
    fn voc_objects_are_exactly_the_rectangles(annotations in arb_annotations(4, 30, arb_any_shape())) {
        let images = images(4);
        let records = build_records(&DatasetView::new(None, &images, &annotations));

        let annotated: BTreeSet<&str> = annotations.iter().map(|a| a.image_id.as_str()).collect();
        prop_assert_eq!(records.len(), annotated.len());

        let objects: usize = records.iter().map(|r| r.annotation.object.len()).sum();
        let rects = annotations
            .iter()
            .filter(|a| matches!(a.shape, Shape::Rectangle(_)))
            .count();
        prop_assert_eq!(objects, rects);
    }

    #[test]
    fn json_roundtrip_is_lossless(annotations in arb_annotations(3, 20, arb_any_shape())) {
        let images = images(3);
        let view = DatasetView::new(None, &images, &annotations);

        let json = ExportFormat::Json.export(&view).expect("serialize json");
        let restored = ExportFormat::Json.import(&json, &[]).expect("parse json");

        prop_assert_eq!(restored.images, images);
        prop_assert_eq!(restored.annotations, annotations);
    }
}
