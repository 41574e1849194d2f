//! Seat layout generation for cinema rooms.
//!
//! Rooms are rectangular: `rows x seats_per_row`. Rows are labelled with
//! spreadsheet-style letters (`A`..`Z`, `AA`, `AB`, ...) and seats are
//! numbered from 1 within each row, so a seat label reads like `C7`.

/// Largest number of rows a room may have.
pub const MAX_ROWS: i32 = 52;

/// Largest number of seats in a single row.
pub const MAX_SEATS_PER_ROW: i32 = 60;

/// One generated seat position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeatPosition {
    pub row_label: String,
    pub seat_number: i32,
    pub label: String,
}

/// Label for a zero-based row index (bijective base-26).
pub fn row_label(index: u32) -> String {
    let mut n = index + 1;
    let mut chars = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        chars.push(char::from(b'A' + rem as u8));
        n = (n - 1) / 26;
    }
    chars.iter().rev().collect()
}

/// Human-readable seat label, e.g. `("C", 7)` -> `"C7"`.
pub fn seat_label(row_label: &str, seat_number: i32) -> String {
    format!("{row_label}{seat_number}")
}

/// Validate room dimensions.
pub fn validate_dimensions(rows: i32, seats_per_row: i32) -> Result<(), String> {
    if !(1..=MAX_ROWS).contains(&rows) {
        return Err(format!("Row count must be between 1 and {MAX_ROWS}, got {rows}"));
    }
    if !(1..=MAX_SEATS_PER_ROW).contains(&seats_per_row) {
        return Err(format!(
            "Seats per row must be between 1 and {MAX_SEATS_PER_ROW}, got {seats_per_row}"
        ));
    }
    Ok(())
}

/// Generate every seat of a room in row-major order.
pub fn generate_layout(rows: i32, seats_per_row: i32) -> Result<Vec<SeatPosition>, String> {
    validate_dimensions(rows, seats_per_row)?;

    let mut seats = Vec::with_capacity((rows * seats_per_row) as usize);
    for row in 0..rows {
        let row_label = row_label(row as u32);
        for seat_number in 1..=seats_per_row {
            seats.push(SeatPosition {
                label: seat_label(&row_label, seat_number),
                row_label: row_label.clone(),
                seat_number,
            });
        }
    }
    Ok(seats)
}
