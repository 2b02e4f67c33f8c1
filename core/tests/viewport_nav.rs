use pikuseru_core::viewport::{
    Viewport, MAX_VIEWPORT_SIZE, MIN_VIEWPORT_SIZE, PIXEL_SIZE, ZOOM_STEP,
};
use pikuseru_core::{CANVAS_HEIGHT, CANVAS_WIDTH};

fn viewport(x: u32, y: u32, size: u32) -> Viewport {
    Viewport { x, y, size }
}

#[test]
fn pan_below_threshold_is_ignored() {
    let mut view = viewport(0, 0, 10);
    assert!(!view.pan(5.0, 5.0));
    assert_eq!(view, viewport(0, 0, 10));
}

#[test]
fn pan_at_threshold_moves_whole_cells() {
    let threshold = (PIXEL_SIZE * 2) as f64;
    let mut view = viewport(0, 0, 10);
    // Dragging the canvas up-left scrolls the viewport down-right.
    assert!(view.pan(-threshold, -threshold));
    assert_eq!(view, viewport(2, 2, 10));

    let mut view = viewport(5, 5, 10);
    assert!(view.pan(threshold, threshold));
    assert_eq!(view, viewport(3, 3, 10));
}

#[test]
fn pan_is_clamped_to_canvas() {
    let mut view = viewport(0, 0, 10);
    view.pan(1_000.0, 1_000.0);
    assert_eq!(view, viewport(0, 0, 10));

    let mut view = viewport(0, 0, 10);
    view.pan(-10_000.0, -10_000.0);
    assert_eq!(
        view,
        viewport(CANVAS_WIDTH - 10, CANVAS_HEIGHT - 10, 10)
    );
}

#[test]
fn one_large_axis_moves_both() {
    // The threshold gates the gesture, not each axis.
    let mut view = viewport(20, 20, 10);
    assert!(view.pan(-(PIXEL_SIZE as f64 * 3.0), -(PIXEL_SIZE as f64)));
    assert_eq!(view, viewport(23, 21, 10));
}

#[test]
fn zoom_round_trip_restores_size() {
    let mut view = viewport(40, 40, 50);
    assert!(view.zoom_in(None));
    assert_eq!(view.size, 50 - ZOOM_STEP);
    assert!(view.zoom_out(None));
    assert_eq!(view.size, 50);
}

#[test]
fn zoom_clamps_at_limits() {
    let mut view = viewport(0, 0, MIN_VIEWPORT_SIZE);
    assert!(!view.zoom_in(None));
    assert_eq!(view.size, MIN_VIEWPORT_SIZE);

    let mut view = viewport(0, 0, MAX_VIEWPORT_SIZE);
    assert!(!view.zoom_out(None));
    assert_eq!(view.size, MAX_VIEWPORT_SIZE);

    // Zooming out near the edge keeps the window inside the canvas.
    let mut view = viewport(CANVAS_WIDTH - MIN_VIEWPORT_SIZE, 0, MIN_VIEWPORT_SIZE);
    view.zoom_out(None);
    assert!(view.x + view.size <= CANVAS_WIDTH);
    assert!(view.y + view.size <= CANVAS_HEIGHT);
}

#[test]
fn zoom_in_keeps_anchor_visible() {
    let mut view = viewport(0, 0, 100);
    view.zoom_in(Some((90.0, 90.0)));
    assert_eq!(view.size, 95);
    assert!(view.contains(90, 90));
}

#[test]
fn jump_centers_on_target() {
    let mut view = viewport(0, 0, 10);
    view.jump_to(75, 75);
    assert_eq!(view, viewport(70, 70, 10));

    view.jump_to(0, 149);
    assert_eq!(view, viewport(0, CANVAS_HEIGHT - 10, 10));
}
