//! Handlers for the `/bookings` resource.
//!
//! A booking is recorded only after its payment intent has succeeded. The
//! partial unique index on `booking_seats(session_id, seat_id)` is the final
//! arbiter when two customers race for the same seat.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use cinema_core::booking::{
    ensure_cancellable, generate_reference, validate_cancellation, BookingStatus,
};
use cinema_core::types::DbId;
use cinema_db::models::booking::{BookingSummary, BookingWithSeats, CreateBooking};
use cinema_db::repositories::{BookingRepo, SessionRepo, UserRepo};
use cinema_events::{BookingNotice, DomainEvent, EventKind};
use serde::Deserialize;

use super::payments::{price_selection, verify_intent};
use crate::error::{is_unique_violation, AppError, AppResult};
use crate::middleware::rbac::{RequireAdmin, RequireCustomer};
use crate::payments::{PaymentError, PaymentStatus};
use crate::query::PaginationParams;
use crate::response::DataResponse;
use crate::state::AppState;

/// Request body for `POST /bookings`.
#[derive(Debug, Deserialize)]
pub struct CreateBookingRequest {
    pub session_id: DbId,
    pub seat_ids: Vec<DbId>,
    pub payment_intent_id: String,
}

/// Query parameters for the admin `GET /bookings`.
#[derive(Debug, Default, Deserialize)]
pub struct BookingListParams {
    pub session_id: Option<DbId>,
    pub status: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// POST /api/v1/bookings
///
/// Confirm a booking for a paid selection. Returns 201 with the booking and
/// its seats, and publishes `booking.confirmed`.
pub async fn create(
    State(state): State<AppState>,
    RequireCustomer(user): RequireCustomer,
    Json(input): Json<CreateBookingRequest>,
) -> AppResult<(StatusCode, Json<BookingWithSeats>)> {
    let intent_id = input.payment_intent_id.trim();
    if intent_id.is_empty() {
        return Err(AppError::validation("payment_intent_id is required"));
    }
    if BookingRepo::find_by_payment_intent(&state.pool, intent_id)
        .await?
        .is_some()
    {
        return Err(AppError::conflict(
            "This payment has already been used for a booking",
        ));
    }

    let selection = price_selection(&state, input.session_id, &input.seat_ids).await?;

    let intent = state.payments.retrieve_intent(intent_id).await?;
    if intent.status != PaymentStatus::Succeeded {
        return Err(PaymentError::NotCompleted(intent.status).into());
    }
    verify_intent(&intent, user.user_id, &selection).map_err(AppError::validation)?;

    let booking = BookingRepo::create(
        &state.pool,
        &CreateBooking {
            reference: generate_reference(),
            user_id: user.user_id,
            session_id: selection.session.id,
            total_cents: selection.total_cents,
            currency: selection.session.currency.clone(),
            payment_intent_id: intent.id.clone(),
            seat_ids: selection.seat_ids(),
        },
    )
    .await
    .map_err(|e| {
        if is_unique_violation(&e, "uq_booking_seats_session_seat") {
            AppError::conflict("One or more seats were booked by someone else")
        } else if is_unique_violation(&e, "uq_bookings_payment_intent_id") {
            AppError::conflict("This payment has already been used for a booking")
        } else {
            AppError::Database(e)
        }
    })?;

    tracing::info!(
        booking_id = booking.id,
        user_id = user.user_id,
        session_id = booking.session_id,
        seats = selection.seats.len(),
        "Booking confirmed"
    );

    let full = load_booking(&state, booking.id).await?;
    publish_booking_event(&state, EventKind::BookingConfirmed, &full, user.user_id).await;

    Ok((StatusCode::CREATED, Json(full)))
}

/// GET /api/v1/bookings/me
pub async fn list_mine(
    State(state): State<AppState>,
    RequireCustomer(user): RequireCustomer,
    Query(params): Query<PaginationParams>,
) -> AppResult<Json<DataResponse<Vec<BookingSummary>>>> {
    let (limit, offset) = params.bounds();
    let data = BookingRepo::list_for_user(&state.pool, user.user_id, limit, offset).await?;
    Ok(Json(DataResponse { data }))
}

/// GET /api/v1/bookings
pub async fn list_all(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Query(params): Query<BookingListParams>,
) -> AppResult<Json<DataResponse<Vec<BookingSummary>>>> {
    let status = match params.status.as_deref() {
        Some(s) => Some(
            BookingStatus::parse(s)
                .ok_or_else(|| AppError::validation(format!("Unknown booking status '{s}'")))?,
        ),
        None => None,
    };
    let (limit, offset) = cinema_core::pagination::page_bounds(params.limit, params.offset);
    let data = BookingRepo::list_all(&state.pool, params.session_id, status, limit, offset).await?;
    Ok(Json(DataResponse { data }))
}

/// GET /api/v1/bookings/{id}
///
/// Visible to its owner and to admins. Other users get 404.
pub async fn get_by_id(
    State(state): State<AppState>,
    RequireCustomer(user): RequireCustomer,
    Path(id): Path<DbId>,
) -> AppResult<Json<BookingWithSeats>> {
    let booking = load_booking(&state, id).await?;
    if !user.can_access(booking.booking.user_id) {
        return Err(AppError::not_found("Booking", id));
    }
    Ok(Json(booking))
}

/// POST /api/v1/bookings/{id}/cancel
///
/// Cancel a confirmed booking and release its seats. Customers must cancel
/// at least `CANCELLATION_CUTOFF_MINS` before the session; admins may cancel
/// any confirmed booking.
pub async fn cancel(
    State(state): State<AppState>,
    RequireCustomer(user): RequireCustomer,
    Path(id): Path<DbId>,
) -> AppResult<Json<BookingWithSeats>> {
    let booking = BookingRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::not_found("Booking", id))?;
    if !user.can_access(booking.user_id) {
        return Err(AppError::not_found("Booking", id));
    }

    let status = BookingStatus::parse(&booking.status).ok_or_else(|| {
        AppError::InternalError(format!("Booking {id} has unknown status {}", booking.status))
    })?;
    // Admins skip the cutoff, not the status check.
    if user.is_admin() {
        ensure_cancellable(status)?;
    } else {
        let session = SessionRepo::find_by_id(&state.pool, booking.session_id)
            .await?
            .ok_or(AppError::not_found("Session", booking.session_id))?;
        validate_cancellation(status, session.starts_at, Utc::now())?;
    }

    // A concurrent cancel may have won since the status was read.
    if BookingRepo::cancel(&state.pool, id).await?.is_none() {
        return Err(AppError::conflict("Booking is already cancelled"));
    }
    tracing::info!(booking_id = id, user_id = user.user_id, "Booking cancelled");

    let full = load_booking(&state, id).await?;
    publish_booking_event(&state, EventKind::BookingCancelled, &full, user.user_id).await;

    Ok(Json(full))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn load_booking(state: &AppState, id: DbId) -> AppResult<BookingWithSeats> {
    BookingRepo::find_with_seats(&state.pool, id)
        .await?
        .ok_or(AppError::not_found("Booking", id))
}

/// Publish a booking event carrying a [`BookingNotice`] for the mailer.
///
/// The booking is already committed, so failures here are logged only.
async fn publish_booking_event(
    state: &AppState,
    kind: EventKind,
    booking: &BookingWithSeats,
    actor_id: DbId,
) {
    let summary = &booking.booking;
    let customer = match UserRepo::find_by_id(&state.pool, summary.user_id).await {
        Ok(Some(customer)) => customer,
        Ok(None) => {
            tracing::warn!(booking_id = summary.id, "Booking owner not found, event not published");
            return;
        }
        Err(e) => {
            tracing::error!(error = %e, booking_id = summary.id, "Failed to load booking owner");
            return;
        }
    };

    let notice = BookingNotice {
        email: customer.email.clone(),
        customer_name: customer.full_name(),
        reference: summary.reference.clone(),
        movie_title: summary.movie_title.clone(),
        cinema_name: summary.cinema_name.clone(),
        room_name: summary.room_name.clone(),
        starts_at: summary.starts_at,
        seats: booking.seats.iter().map(|s| s.label.clone()).collect(),
        total_cents: summary.total_cents,
        currency: summary.currency.clone(),
    };
    let payload = match serde_json::to_value(&notice) {
        Ok(payload) => payload,
        Err(e) => {
            tracing::error!(error = %e, booking_id = summary.id, "Failed to serialize booking notice");
            return;
        }
    };

    state.event_bus.publish(
        DomainEvent::new(kind, summary.id)
            .by(actor_id)
            .with_payload(payload),
    );
}
