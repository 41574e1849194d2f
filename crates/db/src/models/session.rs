//! Screening session model and DTOs.
//!
//! A session is one scheduled showing of a movie in a room. It is unrelated
//! to login sessions, which live in [`crate::models::user_session`].

use chrono::NaiveDate;
use cinema_core::types::{Cents, DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A session row from the `sessions` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Session {
    pub id: DbId,
    pub movie_id: DbId,
    pub room_id: DbId,
    pub starts_at: Timestamp,
    pub ends_at: Timestamp,
    pub price_cents: Cents,
    pub currency: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A session joined with the names a client needs to display it.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct SessionDetails {
    pub id: DbId,
    pub movie_id: DbId,
    pub movie_title: String,
    pub duration_minutes: i32,
    pub poster_url: Option<String>,
    pub room_id: DbId,
    pub room_name: String,
    pub cinema_id: DbId,
    pub cinema_name: String,
    pub city: String,
    pub starts_at: Timestamp,
    pub ends_at: Timestamp,
    pub price_cents: Cents,
    pub currency: String,
}

/// DTO for scheduling a session.
///
/// When `ends_at` is omitted it is derived from the movie runtime plus the
/// room cleanup time.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateSession {
    pub movie_id: DbId,
    pub room_id: DbId,
    pub starts_at: Timestamp,
    pub ends_at: Option<Timestamp>,
    pub price_cents: Cents,
    pub currency: Option<String>,
}

/// Fully resolved values for inserting a session (defaults already applied).
#[derive(Debug, Clone)]
pub struct NewSession {
    pub movie_id: DbId,
    pub room_id: DbId,
    pub starts_at: Timestamp,
    pub ends_at: Timestamp,
    pub price_cents: Cents,
    pub currency: String,
}

/// DTO for rescheduling or repricing a session. All fields are optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateSession {
    pub starts_at: Option<Timestamp>,
    pub ends_at: Option<Timestamp>,
    pub price_cents: Option<Cents>,
    pub currency: Option<String>,
}

/// Filters for listing sessions.
#[derive(Debug, Clone, Default)]
pub struct SessionFilter {
    pub movie_id: Option<DbId>,
    pub cinema_id: Option<DbId>,
    /// Only sessions starting on this UTC calendar day.
    pub date: Option<NaiveDate>,
    /// Only sessions starting at or after this instant.
    pub starts_after: Option<Timestamp>,
    pub limit: i64,
    pub offset: i64,
}
