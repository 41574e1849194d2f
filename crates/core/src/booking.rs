//! Booking rules: seat selection, pricing, references and cancellation.

use std::collections::BTreeSet;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::{Cents, DbId, Timestamp};

/// Most seats a single booking may hold.
pub const MAX_SEATS_PER_BOOKING: usize = 10;

/// Bookings can no longer be cancelled this close to the session start.
pub const CANCELLATION_CUTOFF_MINS: i64 = 60;

/// Length of a booking reference code.
pub const REFERENCE_LENGTH: usize = 8;

/// Reference alphabet without look-alike characters (`0/O`, `1/I`).
const REFERENCE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// Lifecycle state of a booking, stored as text in `bookings.status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Confirmed,
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "confirmed" => Some(BookingStatus::Confirmed),
            "cancelled" => Some(BookingStatus::Cancelled),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Selection and pricing
// ---------------------------------------------------------------------------

/// Validate a customer's seat selection and return it sorted ascending.
///
/// The selection must be non-empty, contain no duplicates, hold at most
/// [`MAX_SEATS_PER_BOOKING`] seats and reference positive ids only.
pub fn validate_seat_selection(seat_ids: &[DbId]) -> Result<Vec<DbId>, String> {
    if seat_ids.is_empty() {
        return Err("At least one seat must be selected".to_string());
    }
    if seat_ids.len() > MAX_SEATS_PER_BOOKING {
        return Err(format!(
            "A booking may hold at most {MAX_SEATS_PER_BOOKING} seats, got {}",
            seat_ids.len()
        ));
    }
    if let Some(bad) = seat_ids.iter().find(|&&id| id <= 0) {
        return Err(format!("Invalid seat id {bad}"));
    }

    let unique: BTreeSet<DbId> = seat_ids.iter().copied().collect();
    if unique.len() != seat_ids.len() {
        return Err("Seat selection contains duplicates".to_string());
    }
    Ok(unique.into_iter().collect())
}

/// Total price of `seat_count` seats at `price_cents` each.
pub fn total_price(price_cents: Cents, seat_count: usize) -> Result<Cents, String> {
    if price_cents < 0 {
        return Err("Price must not be negative".to_string());
    }
    i64::try_from(seat_count)
        .ok()
        .and_then(|count| price_cents.checked_mul(count))
        .ok_or_else(|| "Booking total is too large".to_string())
}

// ---------------------------------------------------------------------------
// References
// ---------------------------------------------------------------------------

/// Generate a random booking reference, e.g. `K7QX2M9A`.
pub fn generate_reference() -> String {
    let mut rng = rand::rng();
    (0..REFERENCE_LENGTH)
        .map(|_| {
            let idx = rng.random_range(0..REFERENCE_ALPHABET.len());
            char::from(REFERENCE_ALPHABET[idx])
        })
        .collect()
}

/// Whether a string looks like a reference produced by [`generate_reference`].
pub fn is_valid_reference(reference: &str) -> bool {
    reference.len() == REFERENCE_LENGTH
        && reference.bytes().all(|b| REFERENCE_ALPHABET.contains(&b))
}

// ---------------------------------------------------------------------------
// Cancellation
// ---------------------------------------------------------------------------

/// Only confirmed bookings can be cancelled.
pub fn ensure_cancellable(status: BookingStatus) -> Result<(), CoreError> {
    match status {
        BookingStatus::Confirmed => Ok(()),
        other => Err(CoreError::Conflict(format!(
            "Booking is already {}",
            other.as_str()
        ))),
    }
}

/// Customer cancellation: the booking must be cancellable and `now` must be
/// before the cutoff ahead of the session start.
pub fn validate_cancellation(
    status: BookingStatus,
    session_starts_at: Timestamp,
    now: Timestamp,
) -> Result<(), CoreError> {
    ensure_cancellable(status)?;
    let cutoff = session_starts_at - chrono::Duration::minutes(CANCELLATION_CUTOFF_MINS);
    if now >= cutoff {
        return Err(CoreError::Validation(format!(
            "Bookings can only be cancelled up to {CANCELLATION_CUTOFF_MINS} minutes before the session starts"
        )));
    }
    Ok(())
}
