//! Splitting large result sets into output units.
//!
//! A spreadsheet sheet holds at most 1,048,576 rows, so matched rows are
//! written across several sheets named `<base>_1`, `<base>_2`, ...
//! An empty input still yields a single empty unit `<base>_1`.

use crate::error::ReconcileError;

pub const DEFAULT_MAX_ROWS_PER_UNIT: usize = 1_000_000;

#[derive(Debug, Clone, PartialEq)]
pub struct Unit<'a, T> {
    pub name: String,
    pub rows: &'a [T],
}

pub fn chunk_units<'a, T>(
    rows: &'a [T],
    max_unit_size: usize,
    base_name: &str,
) -> Result<Vec<Unit<'a, T>>, ReconcileError> {
    if max_unit_size == 0 {
        return Err(ReconcileError::InvalidUnitSize);
    }
    if rows.is_empty() {
        return Ok(vec![Unit {
            name: unit_name(base_name, 1),
            rows,
        }]);
    }
    Ok(rows
        .chunks(max_unit_size)
        .enumerate()
        .map(|(idx, slice)| Unit {
            name: unit_name(base_name, idx + 1),
            rows: slice,
        })
        .collect())
}

fn unit_name(base_name: &str, index: usize) -> String {
    format!("{base_name}_{index}")
}
