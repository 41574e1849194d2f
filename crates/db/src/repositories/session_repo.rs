//! Repository for the `sessions` (screenings) table.

use cinema_core::types::{Cents, DbId, Timestamp};
use sqlx::{PgConnection, PgPool};

use crate::models::session::{NewSession, Session, SessionDetails, SessionFilter};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str =
    "id, movie_id, room_id, starts_at, ends_at, price_cents, currency, created_at, updated_at";

/// Joined columns for [`SessionDetails`].
const DETAIL_SELECT: &str = "SELECT s.id, s.movie_id, m.title AS movie_title, m.duration_minutes, \
                                    m.poster_url, s.room_id, r.name AS room_name, r.cinema_id, \
                                    c.name AS cinema_name, c.city, s.starts_at, s.ends_at, \
                                    s.price_cents, s.currency \
                             FROM sessions s \
                             JOIN movies m ON m.id = s.movie_id \
                             JOIN rooms r ON r.id = s.room_id \
                             JOIN cinemas c ON c.id = r.cinema_id";

/// Exclusion constraint keeping the sessions of one room from overlapping.
pub const ROOM_SCHEDULE_CONSTRAINT: &str = "ex_sessions_room_schedule";

/// Outcome of a write that only applies while a session has no bookings.
#[derive(Debug)]
pub enum UnbookedWrite<T> {
    Applied(T),
    Missing,
    /// Number of bookings, cancelled ones included.
    Booked(i64),
}

/// Provides CRUD and scheduling queries for sessions.
pub struct SessionRepo;

impl SessionRepo {
    /// Insert a new session, returning the created row.
    pub async fn create(pool: &PgPool, input: &NewSession) -> Result<Session, sqlx::Error> {
        let query = format!(
            "INSERT INTO sessions (movie_id, room_id, starts_at, ends_at, price_cents, currency)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Session>(&query)
            .bind(input.movie_id)
            .bind(input.room_id)
            .bind(input.starts_at)
            .bind(input.ends_at)
            .bind(input.price_cents)
            .bind(&input.currency)
            .fetch_one(pool)
            .await
    }

    /// Find a session by its internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Session>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM sessions WHERE id = $1");
        sqlx::query_as::<_, Session>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a session by ID joined with movie, room and cinema names.
    pub async fn find_details(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<SessionDetails>, sqlx::Error> {
        let query = format!("{DETAIL_SELECT} WHERE s.id = $1");
        sqlx::query_as::<_, SessionDetails>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List sessions matching `filter`, soonest first.
    pub async fn list(
        pool: &PgPool,
        filter: &SessionFilter,
    ) -> Result<Vec<SessionDetails>, sqlx::Error> {
        let query = format!(
            "{DETAIL_SELECT}
             WHERE ($1::BIGINT IS NULL OR s.movie_id = $1)
               AND ($2::BIGINT IS NULL OR r.cinema_id = $2)
               AND ($3::DATE IS NULL OR (s.starts_at AT TIME ZONE 'UTC')::DATE = $3)
               AND ($4::TIMESTAMPTZ IS NULL OR s.starts_at >= $4)
             ORDER BY s.starts_at ASC, s.id ASC
             LIMIT $5 OFFSET $6"
        );
        sqlx::query_as::<_, SessionDetails>(&query)
            .bind(filter.movie_id)
            .bind(filter.cinema_id)
            .bind(filter.date)
            .bind(filter.starts_after)
            .bind(filter.limit)
            .bind(filter.offset)
            .fetch_all(pool)
            .await
    }

    /// Sessions in `room_id` overlapping `[starts_at, ends_at)`.
    ///
    /// `exclude_id` skips the session being rescheduled.
    pub async fn find_overlapping(
        pool: &PgPool,
        room_id: DbId,
        starts_at: Timestamp,
        ends_at: Timestamp,
        exclude_id: Option<DbId>,
    ) -> Result<Vec<Session>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM sessions
             WHERE room_id = $1
               AND starts_at < $3
               AND $2 < ends_at
               AND ($4::BIGINT IS NULL OR id <> $4)
             ORDER BY starts_at"
        );
        sqlx::query_as::<_, Session>(&query)
            .bind(room_id)
            .bind(starts_at)
            .bind(ends_at)
            .bind(exclude_id)
            .fetch_all(pool)
            .await
    }

    /// Overwrite the schedule and price of a session that has no bookings.
    ///
    /// The caller merges the patch with the current row and validates the
    /// result. Fails on [`ROOM_SCHEDULE_CONSTRAINT`] if the new times clash
    /// with another session of the room.
    pub async fn update_unbooked(
        pool: &PgPool,
        id: DbId,
        starts_at: Timestamp,
        ends_at: Timestamp,
        price_cents: Cents,
        currency: &str,
    ) -> Result<UnbookedWrite<Session>, sqlx::Error> {
        let mut tx = pool.begin().await?;
        match Self::lock_and_count_bookings(&mut tx, id).await? {
            None => return Ok(UnbookedWrite::Missing),
            Some(count) if count > 0 => return Ok(UnbookedWrite::Booked(count)),
            Some(_) => {}
        }

        let query = format!(
            "UPDATE sessions SET
                starts_at = $2,
                ends_at = $3,
                price_cents = $4,
                currency = $5
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        let session = sqlx::query_as::<_, Session>(&query)
            .bind(id)
            .bind(starts_at)
            .bind(ends_at)
            .bind(price_cents)
            .bind(currency)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(UnbookedWrite::Applied(session))
    }

    /// Delete a session that has no bookings.
    pub async fn delete_unbooked(pool: &PgPool, id: DbId) -> Result<UnbookedWrite<()>, sqlx::Error> {
        let mut tx = pool.begin().await?;
        match Self::lock_and_count_bookings(&mut tx, id).await? {
            None => return Ok(UnbookedWrite::Missing),
            Some(count) if count > 0 => return Ok(UnbookedWrite::Booked(count)),
            Some(_) => {}
        }

        sqlx::query("DELETE FROM sessions WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(UnbookedWrite::Applied(()))
    }

    /// Lock the session row, then count its bookings. `None` if the session
    /// does not exist.
    ///
    /// A booking insert holds a key-share lock on the session row until it
    /// commits, so the count taken under `FOR UPDATE` includes every booking
    /// that could still commit.
    async fn lock_and_count_bookings(
        conn: &mut PgConnection,
        id: DbId,
    ) -> Result<Option<i64>, sqlx::Error> {
        let locked: Option<DbId> =
            sqlx::query_scalar("SELECT id FROM sessions WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *conn)
                .await?;
        if locked.is_none() {
            return Ok(None);
        }

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM bookings WHERE session_id = $1")
            .bind(id)
            .fetch_one(&mut *conn)
            .await?;
        Ok(Some(count))
    }
}
