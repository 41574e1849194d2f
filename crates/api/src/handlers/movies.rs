//! Handlers for the `/movies` resource.
//!
//! Anonymous callers and customers only see active movies; admins may ask
//! for inactive ones too.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use cinema_core::pagination::page_bounds;
use cinema_core::types::DbId;
use cinema_core::validation::{require_non_blank, validate_request};
use cinema_db::models::movie::{CreateMovie, Movie, MovieFilter, MovieWithCategories, UpdateMovie};
use cinema_db::models::session::{SessionDetails, SessionFilter};
use cinema_db::repositories::{CategoryRepo, MovieRepo, SessionRepo};
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireAdmin;
use crate::query::PaginationParams;
use crate::response::DataResponse;
use crate::state::AppState;

/// Query parameters for `GET /movies`.
#[derive(Debug, Default, Deserialize)]
pub struct MovieListParams {
    pub category_id: Option<DbId>,
    pub search: Option<String>,
    /// Honoured for admins only.
    #[serde(default)]
    pub include_inactive: bool,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// POST /api/v1/movies
pub async fn create(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Json(input): Json<CreateMovie>,
) -> AppResult<(StatusCode, Json<MovieWithCategories>)> {
    validate_request(&input)?;
    require_non_blank("title", &input.title)?;
    ensure_categories_exist(&state, &input.category_ids).await?;

    let movie = MovieRepo::create(&state.pool, &input).await?;
    tracing::info!(movie_id = movie.id, admin_id = admin.user_id, "Movie created");

    let full = load_with_categories(&state, movie.id).await?;
    Ok((StatusCode::CREATED, Json(full)))
}

/// GET /api/v1/movies
pub async fn list(
    State(state): State<AppState>,
    caller: Option<AuthUser>,
    Query(params): Query<MovieListParams>,
) -> AppResult<Json<DataResponse<Vec<MovieWithCategories>>>> {
    let (limit, offset) = page_bounds(params.limit, params.offset);
    let is_admin = caller.as_ref().is_some_and(AuthUser::is_admin);

    let filter = MovieFilter {
        category_id: params.category_id,
        search: params
            .search
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty()),
        include_inactive: params.include_inactive && is_admin,
        limit,
        offset,
    };
    let data = MovieRepo::list(&state.pool, &filter).await?;
    Ok(Json(DataResponse { data }))
}

/// GET /api/v1/movies/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    caller: Option<AuthUser>,
    Path(id): Path<DbId>,
) -> AppResult<Json<MovieWithCategories>> {
    let movie = load_with_categories(&state, id).await?;
    ensure_visible(&movie.movie, caller.as_ref())?;
    Ok(Json(movie))
}

/// GET /api/v1/movies/{id}/sessions
///
/// Upcoming sessions of a movie across all cinemas, soonest first. An
/// inactive movie is 404 for everyone but admins, as on `GET /movies/{id}`.
pub async fn list_sessions(
    State(state): State<AppState>,
    caller: Option<AuthUser>,
    Path(id): Path<DbId>,
    Query(params): Query<PaginationParams>,
) -> AppResult<Json<DataResponse<Vec<SessionDetails>>>> {
    let movie = find_movie(&state, id).await?;
    ensure_visible(&movie, caller.as_ref())?;

    let (limit, offset) = params.bounds();
    let filter = SessionFilter {
        movie_id: Some(id),
        starts_after: Some(Utc::now()),
        limit,
        offset,
        ..SessionFilter::default()
    };
    let data = SessionRepo::list(&state.pool, &filter).await?;
    Ok(Json(DataResponse { data }))
}

/// PUT /api/v1/movies/{id}
///
/// A present `category_ids` replaces the movie's categories.
pub async fn update(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateMovie>,
) -> AppResult<Json<MovieWithCategories>> {
    validate_request(&input)?;
    if let Some(title) = &input.title {
        require_non_blank("title", title)?;
    }
    if let Some(ids) = &input.category_ids {
        ensure_categories_exist(&state, ids).await?;
    }

    MovieRepo::update(&state.pool, id, &input)
        .await?
        .ok_or(AppError::not_found("Movie", id))?;

    Ok(Json(load_with_categories(&state, id).await?))
}

/// DELETE /api/v1/movies/{id}
///
/// Fails with 409 while sessions still reference the movie; deactivate it
/// instead to hide it from the catalogue.
pub async fn delete(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    if MovieRepo::delete(&state.pool, id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::not_found("Movie", id))
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn ensure_visible(movie: &Movie, caller: Option<&AuthUser>) -> AppResult<()> {
    if movie.is_active || caller.is_some_and(AuthUser::is_admin) {
        Ok(())
    } else {
        Err(AppError::not_found("Movie", movie.id))
    }
}

async fn find_movie(state: &AppState, id: DbId) -> AppResult<Movie> {
    MovieRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::not_found("Movie", id))
}

async fn load_with_categories(state: &AppState, id: DbId) -> AppResult<MovieWithCategories> {
    MovieRepo::find_with_categories(&state.pool, id)
        .await?
        .ok_or(AppError::not_found("Movie", id))
}

/// Reject category ids that do not exist (duplicates are tolerated).
async fn ensure_categories_exist(state: &AppState, ids: &[DbId]) -> AppResult<()> {
    if ids.is_empty() {
        return Ok(());
    }
    let mut unique = ids.to_vec();
    unique.sort_unstable();
    unique.dedup();

    let found = CategoryRepo::count_existing(&state.pool, &unique).await?;
    if found != unique.len() as i64 {
        return Err(AppError::validation("One or more category ids do not exist"));
    }
    Ok(())
}
