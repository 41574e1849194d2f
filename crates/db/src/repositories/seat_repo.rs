//! Repository for the `seats` table.

use cinema_core::types::DbId;
use sqlx::PgPool;

use crate::models::seat::{Seat, SeatAvailability};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, room_id, row_label, seat_number, label, created_at, updated_at";

/// Provides read operations for seats. Seats are created with their room.
pub struct SeatRepo;

impl SeatRepo {
    /// List the seats of a room in row-major order.
    pub async fn list_by_room(pool: &PgPool, room_id: DbId) -> Result<Vec<Seat>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM seats
             WHERE room_id = $1
             ORDER BY LENGTH(row_label), row_label, seat_number"
        );
        sqlx::query_as::<_, Seat>(&query)
            .bind(room_id)
            .fetch_all(pool)
            .await
    }

    /// Fetch the seats among `seat_ids` that belong to `room_id`.
    ///
    /// A result shorter than `seat_ids` means some ids are unknown or belong
    /// to another room.
    pub async fn find_in_room(
        pool: &PgPool,
        room_id: DbId,
        seat_ids: &[DbId],
    ) -> Result<Vec<Seat>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM seats
             WHERE room_id = $1 AND id = ANY($2)
             ORDER BY id"
        );
        sqlx::query_as::<_, Seat>(&query)
            .bind(room_id)
            .bind(seat_ids)
            .fetch_all(pool)
            .await
    }

    /// Seat map of a session: every seat of its room with a booked flag.
    pub async fn availability_for_session(
        pool: &PgPool,
        session_id: DbId,
    ) -> Result<Vec<SeatAvailability>, sqlx::Error> {
        sqlx::query_as::<_, SeatAvailability>(
            "SELECT st.id, st.row_label, st.seat_number, st.label,
                    (bs.seat_id IS NOT NULL) AS is_booked
             FROM sessions s
             JOIN seats st ON st.room_id = s.room_id
             LEFT JOIN booking_seats bs
                    ON bs.session_id = s.id AND bs.seat_id = st.id
                   AND bs.released_at IS NULL
             WHERE s.id = $1
             ORDER BY LENGTH(st.row_label), st.row_label, st.seat_number",
        )
        .bind(session_id)
        .fetch_all(pool)
        .await
    }

    /// Return the ids among `seat_ids` already sold for `session_id`.
    pub async fn booked_among(
        pool: &PgPool,
        session_id: DbId,
        seat_ids: &[DbId],
    ) -> Result<Vec<DbId>, sqlx::Error> {
        let rows: Vec<(DbId,)> = sqlx::query_as(
            "SELECT seat_id FROM booking_seats
             WHERE session_id = $1 AND seat_id = ANY($2) AND released_at IS NULL
             ORDER BY seat_id",
        )
        .bind(session_id)
        .bind(seat_ids)
        .fetch_all(pool)
        .await?;
        Ok(rows.into_iter().map(|(id,)| id).collect())
    }
}
