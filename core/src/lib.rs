pub mod abi;
pub mod address;
pub mod cell;
pub mod chunk;
pub mod color;
pub mod ops;
pub mod pxnft;
pub mod viewport;

pub use address::{Address, AddressError};
pub use cell::{
    cell_coords, cell_id, is_composite_id, CellError, CellKey, CANVAS_CELLS, CANVAS_HEIGHT,
    CANVAS_WIDTH, COMPOSITE_ID_BASE,
};
pub use chunk::{plan_chunks, Chunk, VIEWPORT_DEBOUNCE_MS};
pub use color::{Color, ColorError, DEFAULT_COLOR, PALETTE};
pub use ops::{OpContext, OpKind};
pub use pxnft::{decode_log, PixelEvent, RangePage, RawLog};
pub use viewport::{Viewport, MAX_VIEWPORT_SIZE, MIN_VIEWPORT_SIZE, PIXEL_SIZE};
