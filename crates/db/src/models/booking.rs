//! Booking model and DTOs.

use cinema_core::types::{Cents, DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A booking row from the `bookings` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Booking {
    pub id: DbId,
    pub reference: String,
    pub user_id: DbId,
    pub session_id: DbId,
    pub status: String,
    pub total_cents: Cents,
    pub currency: String,
    pub payment_intent_id: String,
    pub cancelled_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A booking joined with session, movie and venue names.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct BookingSummary {
    pub id: DbId,
    pub reference: String,
    pub user_id: DbId,
    pub session_id: DbId,
    pub status: String,
    pub total_cents: Cents,
    pub currency: String,
    pub payment_intent_id: String,
    pub cancelled_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub movie_title: String,
    pub starts_at: Timestamp,
    pub room_name: String,
    pub cinema_name: String,
}

/// A seat held by a booking.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct BookedSeat {
    pub seat_id: DbId,
    pub row_label: String,
    pub seat_number: i32,
    pub label: String,
}

/// A booking summary together with its seats.
#[derive(Debug, Clone, Serialize)]
pub struct BookingWithSeats {
    #[serde(flatten)]
    pub booking: BookingSummary,
    pub seats: Vec<BookedSeat>,
}

/// DTO for inserting a confirmed booking.
#[derive(Debug, Clone)]
pub struct CreateBooking {
    pub reference: String,
    pub user_id: DbId,
    pub session_id: DbId,
    pub total_cents: Cents,
    pub currency: String,
    pub payment_intent_id: String,
    pub seat_ids: Vec<DbId>,
}
