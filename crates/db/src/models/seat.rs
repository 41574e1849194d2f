//! Seat models.

use cinema_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A seat row from the `seats` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Seat {
    pub id: DbId,
    pub room_id: DbId,
    pub row_label: String,
    pub seat_number: i32,
    pub label: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A seat annotated with its availability for one session.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct SeatAvailability {
    pub id: DbId,
    pub row_label: String,
    pub seat_number: i32,
    pub label: String,
    pub is_booked: bool,
}
