//! Role-gated extractors built on [`AuthUser`].
//!
//! | Extractor           | Accepts               | Used for                   |
//! |---------------------|-----------------------|----------------------------|
//! | [`RequireAuth`]     | any signed-in user    | own profile                |
//! | [`RequireCustomer`] | `customer` or `admin` | checkout and bookings      |
//! | [`RequireAdmin`]    | `admin`               | catalogue, schedule, users |

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use cinema_core::error::CoreError;
use cinema_core::roles::{ROLE_ADMIN, ROLE_CUSTOMER};

use super::auth::AuthUser;
use crate::error::AppError;
use crate::state::AppState;

/// Authenticate the request and check the role against `allowed`.
/// An empty `allowed` list accepts every role.
async fn authorize(
    parts: &mut Parts,
    state: &AppState,
    allowed: &[&str],
    denied_msg: &str,
) -> Result<AuthUser, AppError> {
    let user = <AuthUser as FromRequestParts<AppState>>::from_request_parts(parts, state).await?;
    if !allowed.is_empty() && !allowed.contains(&user.role.as_str()) {
        tracing::debug!(user_id = user.user_id, role = %user.role, "Role check failed");
        return Err(AppError::Core(CoreError::Forbidden(denied_msg.to_owned())));
    }
    Ok(user)
}

pub struct RequireAdmin(pub AuthUser);

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, AppError> {
        authorize(parts, state, &[ROLE_ADMIN], "Admin role required")
            .await
            .map(RequireAdmin)
    }
}

/// Anyone allowed to buy tickets. Admins can book on behalf of the box office.
pub struct RequireCustomer(pub AuthUser);

impl FromRequestParts<AppState> for RequireCustomer {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, AppError> {
        authorize(
            parts,
            state,
            &[ROLE_CUSTOMER, ROLE_ADMIN],
            "Customer account required",
        )
        .await
        .map(RequireCustomer)
    }
}

pub struct RequireAuth(pub AuthUser);

impl FromRequestParts<AppState> for RequireAuth {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, AppError> {
        authorize(parts, state, &[], "").await.map(RequireAuth)
    }
}
