use std::fmt;

pub const CANVAS_WIDTH: u32 = 150;
pub const CANVAS_HEIGHT: u32 = 150;
pub const CANVAS_CELLS: u64 = CANVAS_WIDTH as u64 * CANVAS_HEIGHT as u64;

/// Token ids at or above this value denote composite NFTs, not single cells.
pub const COMPOSITE_ID_BASE: u64 = 100_000;

pub type CellKey = (u32, u32);

/// `id = y * CANVAS_WIDTH + x`. Out-of-range coordinates are rejected
/// instead of wrapping into a neighbouring row.
pub fn cell_id(x: u32, y: u32) -> Result<u64, CellError> {
    if x >= CANVAS_WIDTH || y >= CANVAS_HEIGHT {
        return Err(CellError::OutOfBounds { x, y });
    }
    Ok(y as u64 * CANVAS_WIDTH as u64 + x as u64)
}

/// Exact inverse of [`cell_id`] over the valid canvas range.
pub fn cell_coords(id: u64) -> Result<CellKey, CellError> {
    if id >= CANVAS_CELLS {
        return Err(CellError::InvalidId { id });
    }
    Ok((
        (id % CANVAS_WIDTH as u64) as u32,
        (id / CANVAS_WIDTH as u64) as u32,
    ))
}

pub fn is_composite_id(id: u64) -> bool {
    id >= COMPOSITE_ID_BASE
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellError {
    OutOfBounds { x: u32, y: u32 },
    InvalidId { id: u64 },
}

impl fmt::Display for CellError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellError::OutOfBounds { x, y } => {
                write!(
                    f,
                    "cell ({x}, {y}) outside {CANVAS_WIDTH}x{CANVAS_HEIGHT} canvas"
                )
            }
            CellError::InvalidId { id } => {
                write!(f, "token id {id} is not a canvas cell")
            }
        }
    }
}

impl std::error::Error for CellError {}
