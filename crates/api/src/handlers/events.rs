//! Admin handlers for the persisted event log.

use axum::extract::{Path, Query, State};
use axum::Json;
use cinema_core::pagination::page_bounds;
use cinema_core::types::DbId;
use cinema_db::models::event::{Event, EventType};
use cinema_db::repositories::EventRepo;
use serde::Deserialize;

use crate::error::AppResult;
use crate::middleware::rbac::RequireAdmin;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct EventListParams {
    /// Dotted type name, e.g. `booking.cancelled`.
    #[serde(rename = "type")]
    pub event_type: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// GET /api/v1/events?type=&limit=&offset=
///
/// Most recent events first.
pub async fn list_recent(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Query(params): Query<EventListParams>,
) -> AppResult<Json<DataResponse<Vec<Event>>>> {
    let (limit, offset) = page_bounds(params.limit, params.offset);
    let data =
        EventRepo::list_recent(&state.pool, params.event_type.as_deref(), limit, offset).await?;
    Ok(Json(DataResponse { data }))
}

/// GET /api/v1/events/types
pub async fn list_types(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> AppResult<Json<DataResponse<Vec<EventType>>>> {
    let data = EventRepo::list_event_types(&state.pool).await?;
    Ok(Json(DataResponse { data }))
}

/// GET /api/v1/events/{subject_type}/{subject_id}
///
/// History of one entity (e.g. `booking/42`), oldest first.
pub async fn list_for_subject(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path((subject_type, subject_id)): Path<(String, DbId)>,
) -> AppResult<Json<DataResponse<Vec<Event>>>> {
    let data = EventRepo::list_for_subject(&state.pool, &subject_type, subject_id).await?;
    Ok(Json(DataResponse { data }))
}
