//! Seat grid generation for a newly scheduled session.
//!
//! An area of `spot_count` seats with `spot_per_row` seats per row yields
//! `spot_count / spot_per_row` full rows. Leftover seats that would form a partial row are
//! not generated. Rows are lettered A..Z, then AA, AB, .. AZ, BA, .. ZZ, AAA and so on.

use crate::error::BookingError;
use crate::models::SpotSeed;

pub const MAX_SPOTS_PER_SESSION: i64 = 10_000;

/// Letters for the 1-based row `index`.
pub fn row_label(index: u32) -> String {
    let mut remaining = index;
    let mut letters = Vec::new();
    while remaining > 0 {
        remaining -= 1;
        letters.push(char::from(b'A' + (remaining % 26) as u8));
        remaining /= 26;
    }
    letters.iter().rev().collect()
}

/// Plans every spot of a session laid out in an area of the given dimensions.
pub fn generate(spot_count: i32, spot_per_row: i32) -> Result<Vec<SpotSeed>, BookingError> {
    if spot_count <= 0 || spot_per_row <= 0 {
        return Err(BookingError::Validation(format!(
            "area dimensions must be positive (spot_count={spot_count}, spot_per_row={spot_per_row})"
        )));
    }

    let row_count = spot_count / spot_per_row;
    let total = i64::from(row_count) * i64::from(spot_per_row);
    if total > MAX_SPOTS_PER_SESSION {
        return Err(BookingError::Validation(format!(
            "area would generate {total} spots, more than the {MAX_SPOTS_PER_SESSION} allowed"
        )));
    }

    let mut grid = Vec::with_capacity(total as usize);
    for row_index in 1..=row_count as u32 {
        let row = row_label(row_index);
        for number in 1..=spot_per_row {
            grid.push(SpotSeed {
                row: row.clone(),
                number,
            });
        }
    }

    Ok(grid)
}
