//! Handlers for the `/payments` resource.
//!
//! `POST /payments/intent` prices a seat selection and opens a payment intent
//! with the configured provider. The same selection checks run again when the
//! booking is confirmed (see [`super::bookings::create`]).

use std::collections::BTreeMap;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use cinema_core::booking::{total_price, validate_seat_selection};
use cinema_core::types::{Cents, DbId};
use cinema_db::models::seat::Seat;
use cinema_db::models::session::SessionDetails;
use cinema_db::repositories::{SeatRepo, SessionRepo};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::middleware::rbac::RequireCustomer;
use crate::payments::{CreateIntent, PaymentIntent, META_SEAT_IDS, META_SESSION_ID, META_USER_ID};
use crate::state::AppState;

/// Request body for `POST /payments/intent`.
#[derive(Debug, Deserialize)]
pub struct PaymentIntentRequest {
    pub session_id: DbId,
    pub seat_ids: Vec<DbId>,
}

/// Response of `POST /payments/intent`.
#[derive(Debug, Serialize)]
pub struct PaymentIntentResponse {
    pub payment_intent_id: String,
    /// Handed to the client SDK to confirm the payment.
    pub client_secret: Option<String>,
    pub amount_cents: Cents,
    pub currency: String,
    pub status: String,
}

/// A validated, priced seat selection for one session.
#[derive(Debug)]
pub struct PricedSelection {
    pub session: SessionDetails,
    /// Selected seats, ordered by id.
    pub seats: Vec<Seat>,
    pub total_cents: Cents,
}

impl PricedSelection {
    pub fn seat_ids(&self) -> Vec<DbId> {
        self.seats.iter().map(|s| s.id).collect()
    }

    pub fn seat_labels(&self) -> Vec<String> {
        self.seats.iter().map(|s| s.label.clone()).collect()
    }
}

/// POST /api/v1/payments/intent (also served at `/create-payment-intent`)
pub async fn create_intent(
    State(state): State<AppState>,
    RequireCustomer(user): RequireCustomer,
    Json(input): Json<PaymentIntentRequest>,
) -> AppResult<(StatusCode, Json<PaymentIntentResponse>)> {
    let selection = price_selection(&state, input.session_id, &input.seat_ids).await?;

    let intent = state
        .payments
        .create_intent(&CreateIntent {
            amount_cents: selection.total_cents,
            currency: selection.session.currency.clone(),
            metadata: intent_metadata(user.user_id, selection.session.id, &selection.seat_ids()),
        })
        .await?;

    tracing::info!(
        user_id = user.user_id,
        session_id = selection.session.id,
        payment_intent_id = %intent.id,
        amount_cents = intent.amount_cents,
        provider = state.payments.name(),
        "Payment intent created"
    );

    Ok((
        StatusCode::CREATED,
        Json(PaymentIntentResponse {
            payment_intent_id: intent.id,
            client_secret: intent.client_secret,
            amount_cents: intent.amount_cents,
            currency: intent.currency,
            status: intent.status.as_str().to_string(),
        }),
    ))
}

// ---------------------------------------------------------------------------
// Shared checkout logic
// ---------------------------------------------------------------------------

/// Validate a seat selection against a session and price it.
///
/// Fails when the session is unknown or already started, when a seat is not
/// part of the session's room, or when a seat is already sold.
pub async fn price_selection(
    state: &AppState,
    session_id: DbId,
    seat_ids: &[DbId],
) -> AppResult<PricedSelection> {
    let seat_ids = validate_seat_selection(seat_ids).map_err(AppError::validation)?;

    let session = SessionRepo::find_details(&state.pool, session_id)
        .await?
        .ok_or(AppError::not_found("Session", session_id))?;
    if session.starts_at <= Utc::now() {
        return Err(AppError::validation("This session has already started"));
    }

    let seats = SeatRepo::find_in_room(&state.pool, session.room_id, &seat_ids).await?;
    if seats.len() != seat_ids.len() {
        return Err(AppError::validation(
            "One or more seats do not belong to this session's room",
        ));
    }

    let taken = SeatRepo::booked_among(&state.pool, session_id, &seat_ids).await?;
    if !taken.is_empty() {
        let labels: Vec<&str> = seats
            .iter()
            .filter(|s| taken.contains(&s.id))
            .map(|s| s.label.as_str())
            .collect();
        return Err(AppError::conflict(format!(
            "Seats already booked: {}",
            labels.join(", ")
        )));
    }

    let total_cents = total_price(session.price_cents, seats.len()).map_err(AppError::validation)?;
    Ok(PricedSelection {
        session,
        seats,
        total_cents,
    })
}

/// Metadata recorded on an intent so the booking step can match it.
pub fn intent_metadata(user_id: DbId, session_id: DbId, seat_ids: &[DbId]) -> BTreeMap<String, String> {
    BTreeMap::from([
        (META_USER_ID.to_string(), user_id.to_string()),
        (META_SESSION_ID.to_string(), session_id.to_string()),
        (META_SEAT_IDS.to_string(), join_ids(seat_ids)),
    ])
}

/// Check that a retrieved intent was opened for exactly this purchase.
pub fn verify_intent(
    intent: &PaymentIntent,
    user_id: DbId,
    selection: &PricedSelection,
) -> Result<(), String> {
    if intent.amount_cents != selection.total_cents
        || !intent.currency.eq_ignore_ascii_case(&selection.session.currency)
    {
        return Err(format!(
            "Payment amount {} {} does not match the booking total {} {}",
            intent.amount_cents, intent.currency, selection.total_cents, selection.session.currency
        ));
    }

    let expected = intent_metadata(user_id, selection.session.id, &selection.seat_ids());
    for (key, value) in &expected {
        if intent.metadata.get(key) != Some(value) {
            return Err(format!("Payment was not made for this selection ({key} differs)"));
        }
    }
    Ok(())
}

fn join_ids(ids: &[DbId]) -> String {
    ids.iter().map(ToString::to_string).collect::<Vec<_>>().join(",")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payments::PaymentStatus;

    fn selection() -> PricedSelection {
        let now = Utc::now();
        let seat = |id: DbId, label: &str| Seat {
            id,
            room_id: 4,
            row_label: label[..1].to_string(),
            seat_number: label[1..].parse().unwrap(),
            label: label.to_string(),
            created_at: now,
            updated_at: now,
        };
        PricedSelection {
            session: SessionDetails {
                id: 9,
                movie_id: 1,
                movie_title: "Metropolis".into(),
                duration_minutes: 153,
                poster_url: None,
                room_id: 4,
                room_name: "Hall 1".into(),
                cinema_id: 2,
                cinema_name: "Odeon".into(),
                city: "Lisbon".into(),
                starts_at: now + chrono::Duration::days(1),
                ends_at: now + chrono::Duration::days(1) + chrono::Duration::hours(3),
                price_cents: 900,
                currency: "eur".into(),
            },
            seats: vec![seat(11, "A1"), seat(12, "A2")],
            total_cents: 1800,
        }
    }

    fn intent_for(user_id: DbId, selection: &PricedSelection) -> PaymentIntent {
        PaymentIntent {
            id: "pi_1".into(),
            client_secret: None,
            amount_cents: selection.total_cents,
            currency: "EUR".into(),
            status: PaymentStatus::Succeeded,
            metadata: intent_metadata(user_id, selection.session.id, &selection.seat_ids()),
        }
    }

    #[test]
    fn metadata_joins_seat_ids() {
        let meta = intent_metadata(3, 9, &[11, 12]);
        assert_eq!(meta[META_USER_ID], "3");
        assert_eq!(meta[META_SESSION_ID], "9");
        assert_eq!(meta[META_SEAT_IDS], "11,12");
    }

    #[test]
    fn matching_intent_is_accepted() {
        let sel = selection();
        assert_eq!(verify_intent(&intent_for(3, &sel), 3, &sel), Ok(()));
        assert_eq!(sel.seat_labels(), vec!["A1", "A2"]);
    }

    #[test]
    fn intent_for_another_user_is_rejected() {
        let sel = selection();
        let err = verify_intent(&intent_for(3, &sel), 4, &sel).unwrap_err();
        assert!(err.contains("user_id"));
    }

    #[test]
    fn intent_for_other_seats_is_rejected() {
        let sel = selection();
        let mut intent = intent_for(3, &sel);
        intent
            .metadata
            .insert(META_SEAT_IDS.to_string(), "11,13".to_string());
        assert!(verify_intent(&intent, 3, &sel).is_err());
    }

    #[test]
    fn amount_mismatch_is_rejected() {
        let sel = selection();
        let mut intent = intent_for(3, &sel);
        intent.amount_cents = 900;
        assert!(verify_intent(&intent, 3, &sel)
            .unwrap_err()
            .contains("does not match"));
    }
}
