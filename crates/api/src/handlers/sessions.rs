//! Handlers for the `/sessions` resource (screenings).
//!
//! Sessions in the same room may not overlap. Once tickets have been sold a
//! session can no longer be rescheduled, repriced or deleted.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{NaiveDate, Utc};
use cinema_core::pagination::page_bounds;
use cinema_core::schedule::{
    ends_at_for, normalize_currency, validate_price, validate_time_range, DEFAULT_CLEANUP_MINS,
    DEFAULT_CURRENCY,
};
use cinema_core::types::{DbId, Timestamp};
use cinema_db::models::seat::SeatAvailability;
use cinema_db::models::session::{
    CreateSession, NewSession, Session, SessionDetails, SessionFilter, UpdateSession,
};
use cinema_db::repositories::session_repo::{UnbookedWrite, ROOM_SCHEDULE_CONSTRAINT};
use cinema_db::repositories::{MovieRepo, RoomRepo, SeatRepo, SessionRepo};
use cinema_events::{DomainEvent, EventKind};
use serde::Deserialize;
use serde_json::json;

use crate::error::{is_exclusion_violation, AppError, AppResult};
use crate::middleware::rbac::RequireAdmin;
use crate::response::DataResponse;
use crate::state::AppState;

/// Query parameters for `GET /sessions`.
#[derive(Debug, Default, Deserialize)]
pub struct SessionListParams {
    pub movie_id: Option<DbId>,
    pub cinema_id: Option<DbId>,
    /// UTC calendar day (`YYYY-MM-DD`).
    pub date: Option<NaiveDate>,
    /// Include sessions that already started.
    #[serde(default)]
    pub include_past: bool,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// POST /api/v1/sessions
///
/// Schedule a session. `ends_at` defaults to the movie runtime plus
/// [`DEFAULT_CLEANUP_MINS`]; `currency` defaults to [`DEFAULT_CURRENCY`].
pub async fn create(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Json(input): Json<CreateSession>,
) -> AppResult<(StatusCode, Json<SessionDetails>)> {
    let movie = MovieRepo::find_by_id(&state.pool, input.movie_id)
        .await?
        .ok_or_else(|| AppError::validation(format!("Unknown movie id {}", input.movie_id)))?;
    if !movie.is_active {
        return Err(AppError::validation("Cannot schedule an inactive movie"));
    }
    RoomRepo::find_by_id(&state.pool, input.room_id)
        .await?
        .ok_or_else(|| AppError::validation(format!("Unknown room id {}", input.room_id)))?;

    let ends_at = input.ends_at.unwrap_or_else(|| {
        ends_at_for(input.starts_at, movie.duration_minutes, DEFAULT_CLEANUP_MINS)
    });
    validate_time_range(input.starts_at, ends_at).map_err(AppError::validation)?;
    validate_price(input.price_cents).map_err(AppError::validation)?;
    let currency = match input.currency.as_deref() {
        Some(code) => normalize_currency(code).map_err(AppError::validation)?,
        None => DEFAULT_CURRENCY.to_string(),
    };

    ensure_room_free(&state, input.room_id, input.starts_at, ends_at, None).await?;

    let session = SessionRepo::create(
        &state.pool,
        &NewSession {
            movie_id: input.movie_id,
            room_id: input.room_id,
            starts_at: input.starts_at,
            ends_at,
            price_cents: input.price_cents,
            currency,
        },
    )
    .await
    .map_err(|e| schedule_conflict(e, input.room_id))?;

    tracing::info!(
        session_id = session.id,
        movie_id = session.movie_id,
        room_id = session.room_id,
        "Session scheduled"
    );
    state.event_bus.publish(
        DomainEvent::new(EventKind::SessionCreated, session.id)
            .by(admin.user_id)
            .with_payload(json!({
                "movie_id": session.movie_id,
                "room_id": session.room_id,
                "starts_at": session.starts_at,
            })),
    );

    let details = find_details(&state, session.id).await?;
    Ok((StatusCode::CREATED, Json(details)))
}

/// GET /api/v1/sessions
///
/// Upcoming sessions by default, soonest first.
pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<SessionListParams>,
) -> AppResult<Json<DataResponse<Vec<SessionDetails>>>> {
    let (limit, offset) = page_bounds(params.limit, params.offset);
    let filter = SessionFilter {
        movie_id: params.movie_id,
        cinema_id: params.cinema_id,
        date: params.date,
        starts_after: (!params.include_past).then(Utc::now),
        limit,
        offset,
    };
    let data = SessionRepo::list(&state.pool, &filter).await?;
    Ok(Json(DataResponse { data }))
}

/// GET /api/v1/sessions/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<SessionDetails>> {
    Ok(Json(find_details(&state, id).await?))
}

/// GET /api/v1/sessions/{id}/seats
///
/// Seat map of the session's room, each seat flagged `is_booked`.
pub async fn seat_map(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<SeatAvailability>>>> {
    find_session(&state, id).await?;
    let data = SeatRepo::availability_for_session(&state.pool, id).await?;
    Ok(Json(DataResponse { data }))
}

/// PUT /api/v1/sessions/{id}
///
/// Patch the schedule or price. The merged result is re-validated and
/// overlap-checked against the other sessions of the room.
pub async fn update(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateSession>,
) -> AppResult<Json<SessionDetails>> {
    let current = find_session(&state, id).await?;

    let starts_at = input.starts_at.unwrap_or(current.starts_at);
    // Moving the start without an explicit end keeps the session's length.
    let ends_at = match (input.starts_at, input.ends_at) {
        (_, Some(ends_at)) => ends_at,
        (Some(starts_at), None) => starts_at + (current.ends_at - current.starts_at),
        (None, None) => current.ends_at,
    };
    let price_cents = input.price_cents.unwrap_or(current.price_cents);
    let currency = match input.currency.as_deref() {
        Some(code) => normalize_currency(code).map_err(AppError::validation)?,
        None => current.currency.clone(),
    };

    validate_time_range(starts_at, ends_at).map_err(AppError::validation)?;
    validate_price(price_cents).map_err(AppError::validation)?;
    ensure_room_free(&state, current.room_id, starts_at, ends_at, Some(id)).await?;

    let write =
        SessionRepo::update_unbooked(&state.pool, id, starts_at, ends_at, price_cents, &currency)
            .await
            .map_err(|e| schedule_conflict(e, current.room_id))?;
    unbooked(id, write)?;

    Ok(Json(find_details(&state, id).await?))
}

/// DELETE /api/v1/sessions/{id}
pub async fn delete(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    unbooked(id, SessionRepo::delete_unbooked(&state.pool, id).await?)?;

    state
        .event_bus
        .publish(DomainEvent::new(EventKind::SessionDeleted, id).by(admin.user_id));
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn find_session(state: &AppState, id: DbId) -> AppResult<Session> {
    SessionRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::not_found("Session", id))
}

async fn find_details(state: &AppState, id: DbId) -> AppResult<SessionDetails> {
    SessionRepo::find_details(&state.pool, id)
        .await?
        .ok_or(AppError::not_found("Session", id))
}

fn unbooked<T>(id: DbId, write: UnbookedWrite<T>) -> AppResult<T> {
    match write {
        UnbookedWrite::Applied(value) => Ok(value),
        UnbookedWrite::Missing => Err(AppError::not_found("Session", id)),
        UnbookedWrite::Booked(count) => Err(AppError::conflict(format!(
            "Session {id} already has {count} booking(s)"
        ))),
    }
}

/// A concurrent write that slipped past [`ensure_room_free`] trips the
/// room's exclusion constraint instead.
fn schedule_conflict(err: sqlx::Error, room_id: DbId) -> AppError {
    if is_exclusion_violation(&err, ROOM_SCHEDULE_CONSTRAINT) {
        AppError::conflict(format!("Room {room_id} already has a session at that time"))
    } else {
        err.into()
    }
}

async fn ensure_room_free(
    state: &AppState,
    room_id: DbId,
    starts_at: Timestamp,
    ends_at: Timestamp,
    exclude_id: Option<DbId>,
) -> AppResult<()> {
    let clashes =
        SessionRepo::find_overlapping(&state.pool, room_id, starts_at, ends_at, exclude_id).await?;
    if let Some(other) = clashes.first() {
        return Err(AppError::conflict(format!(
            "Room {room_id} is already booked by session {} ({} to {})",
            other.id, other.starts_at, other.ends_at
        )));
    }
    Ok(())
}
