//! Handlers for the `/rooms` resource.
//!
//! Rooms are created under their cinema (see [`super::cinemas::create_room`]).
//! The seat layout is fixed once created, so updates only rename.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use cinema_core::types::DbId;
use cinema_core::validation::{require_non_blank, validate_request};
use cinema_db::models::room::{Room, UpdateRoom};
use cinema_db::models::seat::Seat;
use cinema_db::repositories::{RoomRepo, SeatRepo};

use super::cinemas::map_room_conflict;
use crate::error::{AppError, AppResult};
use crate::middleware::rbac::RequireAdmin;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/rooms/{id}
pub async fn get_by_id(State(state): State<AppState>, Path(id): Path<DbId>) -> AppResult<Json<Room>> {
    Ok(Json(find_room(&state, id).await?))
}

/// GET /api/v1/rooms/{id}/seats
pub async fn list_seats(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<Seat>>>> {
    find_room(&state, id).await?;
    let data = SeatRepo::list_by_room(&state.pool, id).await?;
    Ok(Json(DataResponse { data }))
}

/// PUT /api/v1/rooms/{id}
pub async fn update(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateRoom>,
) -> AppResult<Json<Room>> {
    validate_request(&input)?;
    if let Some(name) = &input.name {
        require_non_blank("name", name)?;
    }

    let room = RoomRepo::update(&state.pool, id, &input)
        .await
        .map_err(map_room_conflict)?
        .ok_or(AppError::not_found("Room", id))?;
    Ok(Json(room))
}

/// DELETE /api/v1/rooms/{id}
///
/// Fails with 409 while sessions are scheduled in the room.
pub async fn delete(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    if RoomRepo::delete(&state.pool, id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::not_found("Room", id))
    }
}

async fn find_room(state: &AppState, id: DbId) -> AppResult<Room> {
    RoomRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::not_found("Room", id))
}
