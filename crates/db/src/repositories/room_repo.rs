//! Repository for the `rooms` table.

use cinema_core::seating::SeatPosition;
use cinema_core::types::DbId;
use sqlx::PgPool;

use crate::models::room::{CreateRoom, Room, UpdateRoom};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, cinema_id, name, row_count, seats_per_row, created_at, updated_at";

/// Provides CRUD operations for rooms.
pub struct RoomRepo;

impl RoomRepo {
    /// Insert a room and all of its seats in one transaction.
    ///
    /// `layout` must already be validated against `input.row_count` and
    /// `input.seats_per_row` (see `cinema_core::seating::generate_layout`).
    pub async fn create(
        pool: &PgPool,
        cinema_id: DbId,
        input: &CreateRoom,
        layout: &[SeatPosition],
    ) -> Result<Room, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "INSERT INTO rooms (cinema_id, name, row_count, seats_per_row)
             VALUES ($1, $2, $3, $4)
             RETURNING {COLUMNS}"
        );
        let room = sqlx::query_as::<_, Room>(&query)
            .bind(cinema_id)
            .bind(input.name.trim())
            .bind(input.row_count)
            .bind(input.seats_per_row)
            .fetch_one(&mut *tx)
            .await?;

        let row_labels: Vec<&str> = layout.iter().map(|s| s.row_label.as_str()).collect();
        let seat_numbers: Vec<i32> = layout.iter().map(|s| s.seat_number).collect();
        let labels: Vec<&str> = layout.iter().map(|s| s.label.as_str()).collect();

        sqlx::query(
            "INSERT INTO seats (room_id, row_label, seat_number, label)
             SELECT $1, r, n, l
             FROM UNNEST($2::TEXT[], $3::INTEGER[], $4::TEXT[]) AS t(r, n, l)",
        )
        .bind(room.id)
        .bind(&row_labels)
        .bind(&seat_numbers)
        .bind(&labels)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        tracing::debug!(room_id = room.id, seats = layout.len(), "Room created with seats");
        Ok(room)
    }

    /// Find a room by its internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Room>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM rooms WHERE id = $1");
        sqlx::query_as::<_, Room>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List the rooms of a cinema ordered by name.
    pub async fn list_by_cinema(pool: &PgPool, cinema_id: DbId) -> Result<Vec<Room>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM rooms WHERE cinema_id = $1 ORDER BY name ASC");
        sqlx::query_as::<_, Room>(&query)
            .bind(cinema_id)
            .fetch_all(pool)
            .await
    }

    /// Rename a room. Returns `None` if no row with the given `id` exists.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateRoom,
    ) -> Result<Option<Room>, sqlx::Error> {
        let query = format!(
            "UPDATE rooms SET name = COALESCE(TRIM($2), name)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Room>(&query)
            .bind(id)
            .bind(&input.name)
            .fetch_optional(pool)
            .await
    }

    /// Delete a room and its seats.
    ///
    /// Fails with a foreign key violation while sessions are scheduled in it.
    /// Returns `true` if a row was removed.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM rooms WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
