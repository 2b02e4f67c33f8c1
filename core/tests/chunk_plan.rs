use std::collections::HashSet;

use pikuseru_core::chunk::{plan_chunks, CHUNK_SIZE};
use pikuseru_core::viewport::Viewport;
use pikuseru_core::{CANVAS_HEIGHT, CANVAS_WIDTH};

fn viewport(x: u32, y: u32, size: u32) -> Viewport {
    Viewport { x, y, size }
}

fn empty() -> HashSet<String> {
    HashSet::new()
}

#[test]
fn plans_center_out() {
    let plan = plan_chunks(&viewport(0, 0, 10), true, &empty(), &empty());
    assert!(!plan.is_empty());
    // The chunk under the viewport center loads first.
    assert_eq!(plan[0].key(), "5-5-9-9");

    let center = viewport(0, 0, 10).center();
    let mut last = 0.0_f64;
    for chunk in &plan {
        let (cx, cy) = chunk.center();
        let distance = ((cx - center.0).powi(2) + (cy - center.1).powi(2)).sqrt();
        assert!(distance >= last - 1e-9);
        last = distance;
    }
}

#[test]
fn chunks_never_leave_the_canvas() {
    let plan = plan_chunks(
        &viewport(CANVAS_WIDTH - 10, CANVAS_HEIGHT - 10, 10),
        false,
        &empty(),
        &empty(),
    );
    assert!(!plan.is_empty());
    for chunk in &plan {
        assert!(chunk.x0 <= chunk.x1);
        assert!(chunk.y0 <= chunk.y1);
        assert!(chunk.x1 < CANVAS_WIDTH);
        assert!(chunk.y1 < CANVAS_HEIGHT);
        assert_eq!(chunk.x0 % CHUNK_SIZE, 0);
        assert_eq!(chunk.y0 % CHUNK_SIZE, 0);
    }
}

#[test]
fn loaded_and_loading_chunks_are_skipped() {
    let view = viewport(0, 0, 10);
    let plan = plan_chunks(&view, true, &empty(), &empty());
    let total = plan.len();

    let mut loaded = HashSet::new();
    loaded.insert(plan[0].key());
    let mut loading = HashSet::new();
    loading.insert(plan[1].key());

    let replanned = plan_chunks(&view, true, &loaded, &loading);
    assert_eq!(replanned.len(), total - 2);
    for chunk in &replanned {
        assert!(!loaded.contains(&chunk.key()));
        assert!(!loading.contains(&chunk.key()));
    }
}

#[test]
fn grid_alignment_keeps_keys_stable_across_passes() {
    let first = viewport(0, 0, 10);
    let loaded: HashSet<String> = plan_chunks(&first, true, &empty(), &empty())
        .iter()
        .map(|chunk| chunk.key())
        .collect();

    // Panning two cells only exposes the newly uncovered chunk column.
    let shifted = viewport(2, 0, 10);
    let plan = plan_chunks(&shifted, true, &loaded, &empty());
    assert_eq!(plan.len(), 3);
    for chunk in &plan {
        assert_eq!(chunk.x0, 15);
        assert!(!loaded.contains(&chunk.key()));
    }
}

#[test]
fn keys_are_distinct_within_a_pass() {
    let plan = plan_chunks(&viewport(47, 33, 25), false, &empty(), &empty());
    let keys: HashSet<String> = plan.iter().map(|chunk| chunk.key()).collect();
    assert_eq!(keys.len(), plan.len());
}
