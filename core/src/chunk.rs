use std::collections::HashSet;

use crate::cell::{CANVAS_HEIGHT, CANVAS_WIDTH};
use crate::viewport::Viewport;

/// Side length of the square range-query unit, in cells.
pub const CHUNK_SIZE: u32 = 5;

/// Cells of context fetched around the viewport. The first pass keeps the
/// buffer small so something renders quickly; later passes prefetch wider.
pub const INITIAL_BUFFER: u32 = 5;
pub const STEADY_BUFFER: u32 = 15;

/// Concurrent range queries per batch, and the pause between batches. Both
/// are a self-imposed rate limit against the read RPC endpoint.
pub const INITIAL_CONCURRENCY: usize = 3;
pub const STEADY_CONCURRENCY: usize = 5;
pub const INITIAL_BATCH_DELAY_MS: u32 = 100;
pub const STEADY_BATCH_DELAY_MS: u32 = 200;

/// Quiet period after the last viewport change before a load pass runs.
pub const VIEWPORT_DEBOUNCE_MS: u32 = 300;

/// A rectangular range-query unit with inclusive bounds. Chunks are aligned
/// to the global `CHUNK_SIZE` grid and clipped to the canvas, so the same
/// region always produces the same key regardless of viewport position.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Chunk {
    pub x0: u32,
    pub y0: u32,
    pub x1: u32,
    pub y1: u32,
}

impl Chunk {
    pub fn key(&self) -> String {
        format!("{}-{}-{}-{}", self.x0, self.y0, self.x1, self.y1)
    }

    pub fn center(&self) -> (f64, f64) {
        (
            (self.x0 + self.x1) as f64 / 2.0,
            (self.y0 + self.y1) as f64 / 2.0,
        )
    }

    fn priority(&self, center: (f64, f64)) -> f64 {
        let (cx, cy) = self.center();
        let dx = cx - center.0;
        let dy = cy - center.1;
        (dx * dx + dy * dy).sqrt()
    }
}

pub fn buffer_for(first_load: bool) -> u32 {
    if first_load {
        INITIAL_BUFFER
    } else {
        STEADY_BUFFER
    }
}

pub fn concurrency_for(first_load: bool) -> usize {
    if first_load {
        INITIAL_CONCURRENCY
    } else {
        STEADY_CONCURRENCY
    }
}

pub fn batch_delay_ms(first_load: bool) -> u32 {
    if first_load {
        INITIAL_BATCH_DELAY_MS
    } else {
        STEADY_BATCH_DELAY_MS
    }
}

/// Compute the chunks a load pass should fetch: the buffered viewport
/// region, partitioned on the chunk grid, minus chunks already loaded or in
/// flight, ordered center-out. Chunks never extend past the canvas, so the
/// fetch path never sees an out-of-bounds range.
pub fn plan_chunks(
    viewport: &Viewport,
    first_load: bool,
    loaded: &HashSet<String>,
    loading: &HashSet<String>,
) -> Vec<Chunk> {
    let buffer = buffer_for(first_load);
    let start_x = align_down(viewport.x.saturating_sub(buffer));
    let start_y = align_down(viewport.y.saturating_sub(buffer));
    let end_x = (viewport.x + viewport.size + buffer).min(CANVAS_WIDTH) - 1;
    let end_y = (viewport.y + viewport.size + buffer).min(CANVAS_HEIGHT) - 1;

    let center = viewport.center();
    let mut planned: Vec<(Chunk, f64)> = Vec::new();
    let mut y0 = start_y;
    while y0 <= end_y {
        let mut x0 = start_x;
        while x0 <= end_x {
            let chunk = Chunk {
                x0,
                y0,
                x1: (x0 + CHUNK_SIZE - 1).min(CANVAS_WIDTH - 1),
                y1: (y0 + CHUNK_SIZE - 1).min(CANVAS_HEIGHT - 1),
            };
            let key = chunk.key();
            if !loaded.contains(&key) && !loading.contains(&key) {
                planned.push((chunk, chunk.priority(center)));
            }
            x0 += CHUNK_SIZE;
        }
        y0 += CHUNK_SIZE;
    }

    planned.sort_by(|a, b| a.1.total_cmp(&b.1));
    planned.into_iter().map(|(chunk, _)| chunk).collect()
}

fn align_down(value: u32) -> u32 {
    value - value % CHUNK_SIZE
}
