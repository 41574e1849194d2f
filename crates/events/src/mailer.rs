//! Booking confirmation and cancellation emails.
//!
//! The API publishes `booking.confirmed` / `booking.cancelled` events whose
//! payload is a serialized [`BookingNotice`]. [`BookingMailer`] turns those
//! into plain-text emails; rendering is a pure function so it can be tested
//! without an SMTP server.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use cinema_core::types::Cents;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::bus::consume;
use crate::delivery::email::{EmailSender, OutgoingEmail};
use crate::event::{DomainEvent, EventKind};

/// Everything the booking emails need, carried in the event payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookingNotice {
    pub email: String,
    pub customer_name: String,
    pub reference: String,
    pub movie_title: String,
    pub cinema_name: String,
    pub room_name: String,
    pub starts_at: DateTime<Utc>,
    /// Seat labels, e.g. `["C7", "C8"]`.
    pub seats: Vec<String>,
    pub total_cents: Cents,
    pub currency: String,
}

/// Format an amount in minor units, e.g. `(3750, "usd")` -> `"37.50 USD"`.
pub fn format_amount(cents: Cents, currency: &str) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    format!(
        "{sign}{}.{:02} {}",
        abs / 100,
        abs % 100,
        currency.to_ascii_uppercase()
    )
}

/// Render the email for a booking event.
///
/// Returns `None` for other event types or a payload that is not a
/// [`BookingNotice`].
pub fn render_booking_email(event: &DomainEvent) -> Option<OutgoingEmail> {
    let confirmed = match event.kind {
        EventKind::BookingConfirmed => true,
        EventKind::BookingCancelled => false,
        _ => return None,
    };

    let notice: BookingNotice = match event.payload_as() {
        Ok(notice) => notice,
        Err(e) => {
            tracing::warn!(error = %e, kind = %event.kind, booking_id = event.subject_id, "Malformed booking payload");
            return None;
        }
    };

    let when = notice.starts_at.format("%A %-d %B %Y, %H:%M UTC");
    let seats = notice.seats.join(", ");
    let total = format_amount(notice.total_cents, &notice.currency);

    let (subject, body) = if confirmed {
        (
            format!("Booking confirmed: {} ({})", notice.movie_title, notice.reference),
            format!(
                "Hi {name},\n\n\
                 Your tickets are booked.\n\n\
                 Reference: {reference}\n\
                 Movie: {movie}\n\
                 When: {when}\n\
                 Where: {cinema}, {room}\n\
                 Seats: {seats}\n\
                 Total paid: {total}\n\n\
                 Show this reference at the entrance. Enjoy the film!\n",
                name = notice.customer_name,
                reference = notice.reference,
                movie = notice.movie_title,
                cinema = notice.cinema_name,
                room = notice.room_name,
            ),
        )
    } else {
        (
            format!("Booking cancelled: {} ({})", notice.movie_title, notice.reference),
            format!(
                "Hi {name},\n\n\
                 Your booking {reference} for {movie} on {when} has been cancelled.\n\
                 Released seats: {seats}\n\
                 Amount: {total}\n",
                name = notice.customer_name,
                reference = notice.reference,
                movie = notice.movie_title,
            ),
        )
    };

    Some(OutgoingEmail {
        to: notice.email,
        subject,
        body,
    })
}

/// Background service that emails customers about their bookings.
pub struct BookingMailer;

impl BookingMailer {
    /// Send booking emails until the bus is dropped. A failed send is logged
    /// and not retried.
    pub async fn run(sender: Arc<dyn EmailSender>, receiver: broadcast::Receiver<DomainEvent>) {
        consume("booking-mailer", receiver, |event| {
            let sender = Arc::clone(&sender);
            async move {
                let Some(email) = render_booking_email(&event) else {
                    return;
                };
                if let Err(e) = sender.send(&email).await {
                    tracing::error!(
                        error = %e,
                        kind = %event.kind,
                        booking_id = event.subject_id,
                        "Failed to send booking email"
                    );
                }
            }
        })
        .await;
    }
}
