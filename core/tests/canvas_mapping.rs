use pikuseru_core::{
    cell_coords, cell_id, is_composite_id, CellError, CANVAS_CELLS, CANVAS_HEIGHT, CANVAS_WIDTH,
    COMPOSITE_ID_BASE,
};

#[test]
fn maps_coordinates_to_token_ids() {
    assert_eq!(cell_id(0, 0).unwrap(), 0);
    assert_eq!(cell_id(10, 20).unwrap(), 3010);
    assert_eq!(
        cell_id(CANVAS_WIDTH - 1, CANVAS_HEIGHT - 1).unwrap(),
        CANVAS_CELLS - 1
    );
}

#[test]
fn round_trips_every_cell() {
    for y in 0..CANVAS_HEIGHT {
        for x in 0..CANVAS_WIDTH {
            let id = cell_id(x, y).unwrap();
            assert_eq!(cell_coords(id).unwrap(), (x, y));
        }
    }
}

#[test]
fn rejects_out_of_bounds_coordinates() {
    assert_eq!(
        cell_id(CANVAS_WIDTH, 0),
        Err(CellError::OutOfBounds { x: CANVAS_WIDTH, y: 0 })
    );
    assert_eq!(
        cell_id(0, CANVAS_HEIGHT),
        Err(CellError::OutOfBounds { x: 0, y: CANVAS_HEIGHT })
    );
    assert_eq!(
        cell_coords(CANVAS_CELLS),
        Err(CellError::InvalidId { id: CANVAS_CELLS })
    );
}

#[test]
fn composite_ids_are_not_cells() {
    assert!(!is_composite_id(CANVAS_CELLS - 1));
    assert!(is_composite_id(COMPOSITE_ID_BASE));
    assert!(cell_coords(COMPOSITE_ID_BASE).is_err());
}
