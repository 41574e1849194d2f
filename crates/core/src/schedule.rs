//! Screening schedule rules.
//!
//! Sessions occupy a room for the half-open interval `[starts_at, ends_at)`.
//! Two sessions in the same room may not overlap.

use crate::types::{Cents, Timestamp};

/// Minutes added after a movie ends before the room can be used again.
pub const DEFAULT_CLEANUP_MINS: i64 = 15;

/// Currency used when a session is created without one.
pub const DEFAULT_CURRENCY: &str = "usd";

/// Upper bound on a single ticket price (100 000.00 in major units).
pub const MAX_TICKET_PRICE_CENTS: Cents = 10_000_000;

/// Validate that a session ends strictly after it starts.
pub fn validate_time_range(starts_at: Timestamp, ends_at: Timestamp) -> Result<(), String> {
    if ends_at <= starts_at {
        return Err(format!(
            "Session must end after it starts (starts_at={starts_at}, ends_at={ends_at})"
        ));
    }
    Ok(())
}

/// End time of a session when the client does not provide one.
pub fn ends_at_for(starts_at: Timestamp, duration_minutes: i32, cleanup_minutes: i64) -> Timestamp {
    starts_at + chrono::Duration::minutes(i64::from(duration_minutes) + cleanup_minutes)
}

/// Whether two half-open intervals overlap.
pub fn overlaps(
    a_start: Timestamp,
    a_end: Timestamp,
    b_start: Timestamp,
    b_end: Timestamp,
) -> bool {
    a_start < b_end && b_start < a_end
}

/// Validate a ticket price in cents.
pub fn validate_price(price_cents: Cents) -> Result<(), String> {
    if !(0..=MAX_TICKET_PRICE_CENTS).contains(&price_cents) {
        return Err(format!(
            "Ticket price must be between 0 and {MAX_TICKET_PRICE_CENTS} cents, got {price_cents}"
        ));
    }
    Ok(())
}

/// Normalize and validate an ISO 4217 currency code (returned lowercase).
pub fn normalize_currency(code: &str) -> Result<String, String> {
    let code = code.trim();
    if code.len() != 3 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(format!("Invalid currency code '{code}'"));
    }
    Ok(code.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn at(hour: u32, minute: u32) -> Timestamp {
        Utc.with_ymd_and_hms(2026, 3, 14, hour, minute, 0).unwrap()
    }

    #[test]
    fn time_range_requires_positive_length() {
        assert!(validate_time_range(at(18, 0), at(20, 0)).is_ok());
        assert!(validate_time_range(at(18, 0), at(18, 0)).is_err());
        assert!(validate_time_range(at(20, 0), at(18, 0)).is_err());
    }

    #[test]
    fn ends_at_includes_cleanup() {
        let end = ends_at_for(at(18, 0), 120, DEFAULT_CLEANUP_MINS);
        assert_eq!(end, at(18, 0) + Duration::minutes(135));
    }

    #[test]
    fn overlapping_intervals_detected() {
        assert!(overlaps(at(18, 0), at(20, 0), at(19, 0), at(21, 0)));
        assert!(overlaps(at(18, 0), at(20, 0), at(18, 30), at(19, 30)));
    }

    #[test]
    fn back_to_back_sessions_do_not_overlap() {
        assert!(!overlaps(at(18, 0), at(20, 0), at(20, 0), at(22, 0)));
        assert!(!overlaps(at(20, 0), at(22, 0), at(18, 0), at(20, 0)));
    }

    #[test]
    fn price_bounds() {
        assert!(validate_price(0).is_ok());
        assert!(validate_price(1_200).is_ok());
        assert!(validate_price(-1).is_err());
        assert!(validate_price(MAX_TICKET_PRICE_CENTS + 1).is_err());
    }

    #[test]
    fn currency_is_lowercased() {
        assert_eq!(normalize_currency("EUR").unwrap(), "eur");
        assert_eq!(normalize_currency(" usd ").unwrap(), "usd");
    }

    #[test]
    fn malformed_currency_rejected() {
        assert!(normalize_currency("us").is_err());
        assert!(normalize_currency("u$d").is_err());
    }
}
