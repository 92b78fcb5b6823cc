use canvas_annotator::geometry::{Point, Rect};
use canvas_annotator::hit_test::hit_test;
use canvas_annotator::history::SnapshotHistory;
use canvas_annotator::model::{Annotation, AnnotationPatch, Shape};
use canvas_annotator::store::AnnotationStore;
use proptest::prelude::*;

mod proptest_helpers;

use proptest_helpers::{TIMESTAMP, arb_category, arb_rect};

#[derive(Debug, Clone)]
enum Op {
    Add(Rect, String),
    DeleteNewest,
    Recategorize(String),
    Clear,
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (arb_rect(), arb_category()).prop_map(|(r, c)| Op::Add(r, c)),
        2 => Just(Op::DeleteNewest),
        2 => arb_category().prop_map(Op::Recategorize),
        1 => Just(Op::Clear),
    ]
}

/// Apply `op`, falling back to an add when it would be a no-op.
/// Always performs exactly one structural mutation.
fn apply(store: &mut AnnotationStore, op: &Op, next_id: &mut usize) {
    let newest = store.annotations().last().map(|a| a.id.clone());
    let mutated = match (op, newest) {
        (Op::DeleteNewest, Some(id)) => store.delete(&id).is_some(),
        (Op::Recategorize(category), Some(id)) => {
            store.update(&id, AnnotationPatch::new().category(category.clone()))
        }
        (Op::Clear, Some(_)) => {
            store.clear();
            true
        }
        (Op::Add(rect, category), _) => add(store, *rect, category, next_id),
        (_, None) => add(store, Rect::new(0.0, 0.0, 10.0, 10.0), "default", next_id),
    };
    assert!(mutated, "operation {:?} did not mutate", op);
}

fn add(store: &mut AnnotationStore, rect: Rect, category: &str, next_id: &mut usize) -> bool {
    *next_id += 1;
    store.add(Annotation::new(
        format!("a{}", next_id),
        "img",
        category,
        Shape::Rectangle(rect),
        TIMESTAMP,
    ))
}

fn seeded_store(next_id: &mut usize) -> AnnotationStore {
    let mut store = AnnotationStore::new();
    add(&mut store, Rect::new(0.0, 0.0, 20.0, 20.0), "seed", next_id);
    add(&mut store, Rect::new(50.0, 50.0, 20.0, 20.0), "seed", next_id);
    store
}

proptest! {
    #![proptest_config(proptest_helpers::proptest_config())]

    #[test]
    fn n_mutations_then_n_undos_restores(ops in prop::collection::vec(arb_op(), 1..40)) {
        let mut next_id = 0;
        let mut store = seeded_store(&mut next_id);
        let before = store.annotations().to_vec();

        for op in &ops {
            apply(&mut store, op, &mut next_id);
        }
        for _ in &ops {
            prop_assert!(store.undo());
        }

        prop_assert_eq!(store.annotations(), before.as_slice());
    }

    #[test]
    fn undo_then_redo_is_identity(ops in prop::collection::vec(arb_op(), 1..40), undos in 1usize..10) {
        let mut next_id = 0;
        let mut store = seeded_store(&mut next_id);
        for op in &ops {
            apply(&mut store, op, &mut next_id);
        }
        for _ in 0..undos.min(ops.len()) {
            store.undo();
        }

        let before = store.annotations().to_vec();
        prop_assert!(store.undo());
        prop_assert!(store.redo());
        prop_assert_eq!(store.annotations(), before.as_slice());
    }

    #[test]
    fn history_stays_bounded(extra in 0usize..40, limit in 1usize..60) {
        let mut history = SnapshotHistory::new(0usize, limit);
        let pushes = limit + extra;
        for i in 1..=pushes {
            history.push(i);
            prop_assert!(history.len() <= limit);
            prop_assert!(history.cursor() < history.len());
        }

        let mut oldest = pushes;
        while let Some(state) = history.undo() {
            oldest = state;
        }
        // The initial state and everything older than `limit` snapshots is gone.
        prop_assert_eq!(oldest, pushes + 1 - history.len());
    }

    #[test]
    fn selection_never_records_history(ops in prop::collection::vec(arb_op(), 1..20)) {
        let mut next_id = 0;
        let mut store = seeded_store(&mut next_id);
        for op in &ops {
            apply(&mut store, op, &mut next_id);
        }

        let len = store.history_len();
        let cursor = store.history_cursor();
        let ids: Vec<String> = store.annotations().iter().map(|a| a.id.clone()).collect();
        for id in &ids {
            store.select(Some(id));
        }
        store.select(None);

        prop_assert_eq!(store.history_len(), len);
        prop_assert_eq!(store.history_cursor(), cursor);
    }

    #[test]
    fn newest_overlapping_rectangle_wins(a in arb_rect(), b in arb_rect(), tx in 0.0f32..1.0, ty in 0.0f32..1.0) {
        let left = a.x.max(b.x);
        let top = a.y.max(b.y);
        let right = (a.x + a.width).min(b.x + b.width);
        let bottom = (a.y + a.height).min(b.y + b.height);
        prop_assume!(left < right && top < bottom);

        let point = Point::new(left + (right - left) * tx, top + (bottom - top) * ty);
        let anns = [
            Annotation::new("older", "img", "c", Shape::Rectangle(a), TIMESTAMP),
            Annotation::new("newer", "img", "c", Shape::Rectangle(b), TIMESTAMP),
        ];

        let hit = hit_test(anns.iter(), point, 10.0);
        prop_assert_eq!(hit.map(|ann| ann.id.as_str()), Some("newer"));
    }
}

#[test]
fn sixty_mutations_keep_fifty_snapshots() {
    let mut next_id = 0;
    let mut store = AnnotationStore::new();
    for i in 0..60 {
        let rect = Rect::new(i as f32, 0.0, 10.0, 10.0);
        assert!(add(&mut store, rect, "c", &mut next_id));
    }
    assert_eq!(store.history_len(), 50);

    let mut undos = 0;
    while store.undo() {
        undos += 1;
    }
    assert_eq!(undos, 49);
    // Oldest reachable state is the 50th from last: 11 annotations.
    assert_eq!(store.len(), 11);
}
