//! Room model and DTOs.
//!
//! A room's layout (`row_count x seats_per_row`) is fixed at creation time;
//! its seats are generated in the same transaction.

use cinema_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// A room row from the `rooms` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Room {
    pub id: DbId,
    pub cinema_id: DbId,
    pub name: String,
    pub row_count: i32,
    pub seats_per_row: i32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Room {
    pub fn capacity(&self) -> i32 {
        self.row_count * self.seats_per_row
    }
}

/// DTO for creating a room inside a cinema (the cinema comes from the path).
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateRoom {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    pub row_count: i32,
    pub seats_per_row: i32,
}

/// DTO for renaming a room.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateRoom {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
}
