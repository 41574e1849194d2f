//! Handlers for the `/cinemas` resource and the rooms nested under it.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use cinema_core::seating::generate_layout;
use cinema_core::types::DbId;
use cinema_core::validation::{require_non_blank, validate_request};
use cinema_db::models::cinema::{Cinema, CreateCinema, UpdateCinema};
use cinema_db::models::room::{CreateRoom, Room};
use cinema_db::repositories::{CinemaRepo, RoomRepo};
use serde::Deserialize;

use crate::error::{is_unique_violation, AppError, AppResult};
use crate::middleware::rbac::RequireAdmin;
use crate::response::DataResponse;
use crate::state::AppState;

/// Query parameters for `GET /cinemas`.
#[derive(Debug, Default, Deserialize)]
pub struct CinemaListParams {
    pub city: Option<String>,
}

/// POST /api/v1/cinemas
pub async fn create(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Json(input): Json<CreateCinema>,
) -> AppResult<(StatusCode, Json<Cinema>)> {
    validate_request(&input)?;
    require_non_blank("name", &input.name)?;
    require_non_blank("address", &input.address)?;
    require_non_blank("city", &input.city)?;

    let cinema = CinemaRepo::create(&state.pool, &input)
        .await
        .map_err(map_cinema_conflict)?;
    Ok((StatusCode::CREATED, Json(cinema)))
}

/// GET /api/v1/cinemas
pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<CinemaListParams>,
) -> AppResult<Json<DataResponse<Vec<Cinema>>>> {
    let city = params.city.as_deref().map(str::trim).filter(|c| !c.is_empty());
    let data = CinemaRepo::list(&state.pool, city).await?;
    Ok(Json(DataResponse { data }))
}

/// GET /api/v1/cinemas/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<Cinema>> {
    Ok(Json(find_cinema(&state, id).await?))
}

/// PUT /api/v1/cinemas/{id}
pub async fn update(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateCinema>,
) -> AppResult<Json<Cinema>> {
    validate_request(&input)?;
    for (field, value) in [
        ("name", &input.name),
        ("address", &input.address),
        ("city", &input.city),
    ] {
        if let Some(v) = value {
            require_non_blank(field, v)?;
        }
    }

    let cinema = CinemaRepo::update(&state.pool, id, &input)
        .await
        .map_err(map_cinema_conflict)?
        .ok_or(AppError::not_found("Cinema", id))?;
    Ok(Json(cinema))
}

/// DELETE /api/v1/cinemas/{id}
///
/// Removes the cinema with its rooms and seats. Fails with 409 while any of
/// its rooms still has sessions.
pub async fn delete(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    if CinemaRepo::delete(&state.pool, id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::not_found("Cinema", id))
    }
}

// ---------------------------------------------------------------------------
// Rooms of a cinema
// ---------------------------------------------------------------------------

/// GET /api/v1/cinemas/{id}/rooms
pub async fn list_rooms(
    State(state): State<AppState>,
    Path(cinema_id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<Room>>>> {
    find_cinema(&state, cinema_id).await?;
    let data = RoomRepo::list_by_cinema(&state.pool, cinema_id).await?;
    Ok(Json(DataResponse { data }))
}

/// POST /api/v1/cinemas/{id}/rooms
///
/// Create a room and generate its `row_count x seats_per_row` seats.
pub async fn create_room(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(cinema_id): Path<DbId>,
    Json(input): Json<CreateRoom>,
) -> AppResult<(StatusCode, Json<Room>)> {
    validate_request(&input)?;
    require_non_blank("name", &input.name)?;
    let layout = generate_layout(input.row_count, input.seats_per_row).map_err(AppError::validation)?;

    find_cinema(&state, cinema_id).await?;

    let room = RoomRepo::create(&state.pool, cinema_id, &input, &layout)
        .await
        .map_err(map_room_conflict)?;
    tracing::info!(
        room_id = room.id,
        cinema_id,
        seats = layout.len(),
        admin_id = admin.user_id,
        "Room created"
    );
    Ok((StatusCode::CREATED, Json(room)))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn find_cinema(state: &AppState, id: DbId) -> AppResult<Cinema> {
    CinemaRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::not_found("Cinema", id))
}

fn map_cinema_conflict(e: sqlx::Error) -> AppError {
    if is_unique_violation(&e, "uq_cinemas_name") {
        AppError::conflict("A cinema with this name already exists")
    } else {
        AppError::Database(e)
    }
}

/// Room names are unique within a cinema.
pub(crate) fn map_room_conflict(e: sqlx::Error) -> AppError {
    if is_unique_violation(&e, "uq_rooms_cinema_name") {
        AppError::conflict("This cinema already has a room with that name")
    } else {
        AppError::Database(e)
    }
}
