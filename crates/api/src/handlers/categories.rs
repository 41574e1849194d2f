//! Handlers for the `/categories` resource.
//!
//! Reads are public; writes require the `admin` role.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use cinema_core::types::DbId;
use cinema_core::validation::{require_non_blank, validate_request};
use cinema_db::models::category::{Category, CreateCategory, UpdateCategory};
use cinema_db::repositories::CategoryRepo;

use crate::error::{is_unique_violation, AppError, AppResult};
use crate::middleware::rbac::RequireAdmin;
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /api/v1/categories
pub async fn create(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Json(input): Json<CreateCategory>,
) -> AppResult<(StatusCode, Json<Category>)> {
    validate_request(&input)?;
    require_non_blank("name", &input.name)?;

    let category = CategoryRepo::create(&state.pool, &input)
        .await
        .map_err(map_name_conflict)?;
    Ok((StatusCode::CREATED, Json(category)))
}

/// GET /api/v1/categories
pub async fn list(State(state): State<AppState>) -> AppResult<Json<DataResponse<Vec<Category>>>> {
    let data = CategoryRepo::list(&state.pool).await?;
    Ok(Json(DataResponse { data }))
}

/// GET /api/v1/categories/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<Category>> {
    let category = CategoryRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::not_found("Category", id))?;
    Ok(Json(category))
}

/// PUT /api/v1/categories/{id}
pub async fn update(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateCategory>,
) -> AppResult<Json<Category>> {
    validate_request(&input)?;
    if let Some(name) = &input.name {
        require_non_blank("name", name)?;
    }

    let category = CategoryRepo::update(&state.pool, id, &input)
        .await
        .map_err(map_name_conflict)?
        .ok_or(AppError::not_found("Category", id))?;
    Ok(Json(category))
}

/// DELETE /api/v1/categories/{id}
///
/// Unlinks the category from its movies. Returns 204 No Content.
pub async fn delete(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    if CategoryRepo::delete(&state.pool, id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::not_found("Category", id))
    }
}

fn map_name_conflict(e: sqlx::Error) -> AppError {
    if is_unique_violation(&e, "uq_categories_name") {
        AppError::conflict("A category with this name already exists")
    } else {
        AppError::Database(e)
    }
}
