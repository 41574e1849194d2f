//! Repository for the `bookings` and `booking_seats` tables.

use cinema_core::booking::BookingStatus;
use cinema_core::types::DbId;
use sqlx::PgPool;

use crate::models::booking::{BookedSeat, Booking, BookingSummary, BookingWithSeats, CreateBooking};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, reference, user_id, session_id, status, total_cents, currency, \
                       payment_intent_id, cancelled_at, created_at, updated_at";

/// Joined columns for [`BookingSummary`].
const SUMMARY_SELECT: &str = "SELECT b.id, b.reference, b.user_id, b.session_id, b.status, \
                                     b.total_cents, b.currency, b.payment_intent_id, \
                                     b.cancelled_at, b.created_at, m.title AS movie_title, \
                                     s.starts_at, r.name AS room_name, c.name AS cinema_name \
                              FROM bookings b \
                              JOIN sessions s ON s.id = b.session_id \
                              JOIN movies m ON m.id = s.movie_id \
                              JOIN rooms r ON r.id = s.room_id \
                              JOIN cinemas c ON c.id = r.cinema_id";

/// Provides booking creation, lookup and cancellation.
pub struct BookingRepo;

impl BookingRepo {
    /// Insert a confirmed booking and claim its seats in one transaction.
    ///
    /// If another live booking already holds any of the seats, the insert
    /// into `booking_seats` fails on `uq_booking_seats_session_seat` and the
    /// whole booking is rolled back.
    pub async fn create(pool: &PgPool, input: &CreateBooking) -> Result<Booking, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "INSERT INTO bookings
                (reference, user_id, session_id, status, total_cents, currency, payment_intent_id)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {COLUMNS}"
        );
        let booking = sqlx::query_as::<_, Booking>(&query)
            .bind(&input.reference)
            .bind(input.user_id)
            .bind(input.session_id)
            .bind(BookingStatus::Confirmed.as_str())
            .bind(input.total_cents)
            .bind(&input.currency)
            .bind(&input.payment_intent_id)
            .fetch_one(&mut *tx)
            .await?;

        sqlx::query(
            "INSERT INTO booking_seats (booking_id, session_id, seat_id)
             SELECT $1, $2, UNNEST($3::BIGINT[])",
        )
        .bind(booking.id)
        .bind(input.session_id)
        .bind(&input.seat_ids)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(booking)
    }

    /// Find a booking by its internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Booking>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM bookings WHERE id = $1");
        sqlx::query_as::<_, Booking>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find the booking created for a payment intent, if any.
    pub async fn find_by_payment_intent(
        pool: &PgPool,
        payment_intent_id: &str,
    ) -> Result<Option<Booking>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM bookings WHERE payment_intent_id = $1");
        sqlx::query_as::<_, Booking>(&query)
            .bind(payment_intent_id)
            .fetch_optional(pool)
            .await
    }

    /// Find a booking joined with its session, movie and venue names.
    pub async fn find_summary(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<BookingSummary>, sqlx::Error> {
        let query = format!("{SUMMARY_SELECT} WHERE b.id = $1");
        sqlx::query_as::<_, BookingSummary>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Seats held by a booking, in row-major order.
    ///
    /// Released seats of a cancelled booking are still listed.
    pub async fn seats_for(pool: &PgPool, booking_id: DbId) -> Result<Vec<BookedSeat>, sqlx::Error> {
        sqlx::query_as::<_, BookedSeat>(
            "SELECT st.id AS seat_id, st.row_label, st.seat_number, st.label
             FROM booking_seats bs
             JOIN seats st ON st.id = bs.seat_id
             WHERE bs.booking_id = $1
             ORDER BY LENGTH(st.row_label), st.row_label, st.seat_number",
        )
        .bind(booking_id)
        .fetch_all(pool)
        .await
    }

    /// Find a booking summary together with its seats.
    pub async fn find_with_seats(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<BookingWithSeats>, sqlx::Error> {
        let Some(booking) = Self::find_summary(pool, id).await? else {
            return Ok(None);
        };
        let seats = Self::seats_for(pool, id).await?;
        Ok(Some(BookingWithSeats { booking, seats }))
    }

    /// List a user's bookings, newest first.
    pub async fn list_for_user(
        pool: &PgPool,
        user_id: DbId,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<BookingSummary>, sqlx::Error> {
        let query = format!(
            "{SUMMARY_SELECT}
             WHERE b.user_id = $1
             ORDER BY b.created_at DESC, b.id DESC
             LIMIT $2 OFFSET $3"
        );
        sqlx::query_as::<_, BookingSummary>(&query)
            .bind(user_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// List all bookings, optionally for one session or status, newest first.
    pub async fn list_all(
        pool: &PgPool,
        session_id: Option<DbId>,
        status: Option<BookingStatus>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<BookingSummary>, sqlx::Error> {
        let query = format!(
            "{SUMMARY_SELECT}
             WHERE ($1::BIGINT IS NULL OR b.session_id = $1)
               AND ($2::TEXT IS NULL OR b.status = $2)
             ORDER BY b.created_at DESC, b.id DESC
             LIMIT $3 OFFSET $4"
        );
        sqlx::query_as::<_, BookingSummary>(&query)
            .bind(session_id)
            .bind(status.map(BookingStatus::as_str))
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Cancel a confirmed booking and release its seats.
    ///
    /// Returns `None` if the booking does not exist or is not confirmed.
    pub async fn cancel(pool: &PgPool, id: DbId) -> Result<Option<Booking>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "UPDATE bookings SET status = $2, cancelled_at = NOW()
             WHERE id = $1 AND status = $3
             RETURNING {COLUMNS}"
        );
        let booking = sqlx::query_as::<_, Booking>(&query)
            .bind(id)
            .bind(BookingStatus::Cancelled.as_str())
            .bind(BookingStatus::Confirmed.as_str())
            .fetch_optional(&mut *tx)
            .await?;

        if booking.is_some() {
            sqlx::query(
                "UPDATE booking_seats SET released_at = NOW()
                 WHERE booking_id = $1 AND released_at IS NULL",
            )
            .bind(id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(booking)
    }
}
