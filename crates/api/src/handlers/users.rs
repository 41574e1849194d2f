//! Handlers for the `/users` resource.
//!
//! `/users/me*` serves the signed-in user's own profile; the remaining
//! routes are user management and require the `admin` role.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use cinema_core::error::CoreError;
use cinema_core::types::DbId;
use cinema_core::validation::{require_non_blank, validate_request};
use cinema_db::models::role::Role;
use cinema_db::models::user::{CreateUser, UpdateUser, User, UserResponse};
use cinema_db::repositories::{RoleRepo, UserRepo, UserSessionRepo};
use serde::Deserialize;
use validator::Validate;

use crate::auth::password::{hash_password, validate_password_strength, verify_password};
use crate::error::{is_unique_violation, AppError, AppResult};
use crate::middleware::rbac::{RequireAdmin, RequireAuth};
use crate::query::PaginationParams;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// Request body for `PUT /users/me`.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, max = 100))]
    pub first_name: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub last_name: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
}

/// Request body for `PUT /users/me/password`.
#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

/// Request body for `POST /users`.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(length(min = 1, max = 100))]
    pub first_name: String,
    #[validate(length(min = 1, max = 100))]
    pub last_name: String,
    #[validate(email)]
    pub email: String,
    pub password: String,
    pub role_id: DbId,
}

/// Request body for `PUT /users/{id}`.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateUserRequest {
    #[validate(length(min = 1, max = 100))]
    pub first_name: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub last_name: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    pub role_id: Option<DbId>,
    pub is_active: Option<bool>,
}

// ---------------------------------------------------------------------------
// Own profile
// ---------------------------------------------------------------------------

/// GET /api/v1/users/me
pub async fn get_me(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> AppResult<Json<UserResponse>> {
    let row = find_user(&state, user.user_id).await?;
    Ok(Json(user_to_response(&state, &row).await?))
}

/// PUT /api/v1/users/me
///
/// Update the caller's name or email. Role and activation are admin-only.
pub async fn update_me(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(input): Json<UpdateProfileRequest>,
) -> AppResult<Json<UserResponse>> {
    validate_request(&input)?;
    let update_dto = UpdateUser {
        first_name: trimmed(input.first_name, "first_name")?,
        last_name: trimmed(input.last_name, "last_name")?,
        email: input.email.map(|e| e.trim().to_string()),
        ..UpdateUser::default()
    };

    let row = UserRepo::update(&state.pool, user.user_id, &update_dto)
        .await
        .map_err(map_email_conflict)?
        .ok_or(AppError::not_found("User", user.user_id))?;

    Ok(Json(user_to_response(&state, &row).await?))
}

/// PUT /api/v1/users/me/password
///
/// Change the caller's password. Requires the current password and revokes
/// every refresh token, so other devices must sign in again.
pub async fn change_password(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(input): Json<ChangePasswordRequest>,
) -> AppResult<StatusCode> {
    let row = find_user(&state, user.user_id).await?;

    let current_ok = verify_password(&input.current_password, &row.password_hash)
        .map_err(|e| AppError::InternalError(format!("Password verification error: {e}")))?;
    if !current_ok {
        return Err(AppError::Core(CoreError::Unauthorized(
            "Current password is incorrect".into(),
        )));
    }

    validate_password_strength(&input.new_password).map_err(AppError::validation)?;
    let hashed = hash_password(&input.new_password)
        .map_err(|e| AppError::InternalError(format!("Password hashing error: {e}")))?;

    UserRepo::update_password(&state.pool, row.id, &hashed).await?;
    UserSessionRepo::revoke_all_for_user(&state.pool, row.id).await?;
    tracing::info!(user_id = row.id, "Password changed");

    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Admin user management
// ---------------------------------------------------------------------------

/// POST /api/v1/users
///
/// Create a user with an explicit role. Returns 201 Created.
pub async fn create_user(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Json(input): Json<CreateUserRequest>,
) -> AppResult<(StatusCode, Json<UserResponse>)> {
    validate_request(&input)?;
    validate_password_strength(&input.password).map_err(AppError::validation)?;
    find_role(&state, input.role_id).await?;

    let hashed = hash_password(&input.password)
        .map_err(|e| AppError::InternalError(format!("Password hashing error: {e}")))?;

    let create_dto = CreateUser {
        first_name: input.first_name.trim().to_string(),
        last_name: input.last_name.trim().to_string(),
        email: input.email.trim().to_string(),
        password_hash: hashed,
        role_id: input.role_id,
    };

    let user = UserRepo::create(&state.pool, &create_dto)
        .await
        .map_err(map_email_conflict)?;
    tracing::info!(user_id = user.id, admin_id = admin.user_id, "User created by admin");

    let response = user_to_response(&state, &user).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// GET /api/v1/users
///
/// List users (newest first) with resolved role names.
pub async fn list_users(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Query(params): Query<PaginationParams>,
) -> AppResult<Json<DataResponse<Vec<UserResponse>>>> {
    let (limit, offset) = params.bounds();
    let users = UserRepo::list(&state.pool, limit, offset).await?;

    let roles = RoleRepo::names_by_id(&state.pool).await?;

    let data = users
        .iter()
        .map(|u| {
            let role_name = roles.get(&u.role_id).cloned().unwrap_or_default();
            UserResponse::from_user(u, role_name)
        })
        .collect();

    Ok(Json(DataResponse { data }))
}

/// GET /api/v1/users/{id}
pub async fn get_user(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<DbId>,
) -> AppResult<Json<UserResponse>> {
    let user = find_user(&state, id).await?;
    Ok(Json(user_to_response(&state, &user).await?))
}

/// PUT /api/v1/users/{id}
///
/// Update profile fields, role or activation (not the password).
pub async fn update_user(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateUserRequest>,
) -> AppResult<Json<UserResponse>> {
    validate_request(&input)?;
    if let Some(role_id) = input.role_id {
        let role = find_role(&state, role_id).await?;
        if id == admin.user_id && !role.is_admin() {
            return Err(AppError::validation("You cannot remove your own admin role"));
        }
    }
    if id == admin.user_id && input.is_active == Some(false) {
        return Err(AppError::validation("You cannot deactivate your own account"));
    }

    let update_dto = UpdateUser {
        first_name: trimmed(input.first_name, "first_name")?,
        last_name: trimmed(input.last_name, "last_name")?,
        email: input.email.map(|e| e.trim().to_string()),
        role_id: input.role_id,
        is_active: input.is_active,
    };

    let user = UserRepo::update(&state.pool, id, &update_dto)
        .await
        .map_err(map_email_conflict)?
        .ok_or(AppError::not_found("User", id))?;

    Ok(Json(user_to_response(&state, &user).await?))
}

/// DELETE /api/v1/users/{id}
///
/// Soft-deactivate a user and revoke their sessions. Returns 204 No Content.
pub async fn deactivate_user(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    if id == admin.user_id {
        return Err(AppError::validation("You cannot deactivate your own account"));
    }
    if !UserRepo::deactivate(&state.pool, id).await? {
        return Err(AppError::not_found("User", id));
    }
    UserSessionRepo::revoke_all_for_user(&state.pool, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn find_user(state: &AppState, id: DbId) -> AppResult<User> {
    UserRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::not_found("User", id))
}

async fn user_to_response(state: &AppState, user: &User) -> AppResult<UserResponse> {
    let role_name = RoleRepo::resolve_name(&state.pool, user.role_id).await?;
    Ok(UserResponse::from_user(user, role_name))
}

async fn find_role(state: &AppState, role_id: DbId) -> AppResult<Role> {
    RoleRepo::find_by_id(&state.pool, role_id)
        .await?
        .ok_or_else(|| AppError::validation(format!("Unknown role id {role_id}")))
}

/// Trim an optional name and reject values that are blank after trimming.
fn trimmed(value: Option<String>, field: &str) -> AppResult<Option<String>> {
    match value {
        Some(v) => {
            require_non_blank(field, &v)?;
            Ok(Some(v.trim().to_string()))
        }
        None => Ok(None),
    }
}

fn map_email_conflict(e: sqlx::Error) -> AppError {
    if is_unique_violation(&e, "uq_users_email") {
        AppError::conflict("An account with this email already exists")
    } else {
        AppError::Database(e)
    }
}
