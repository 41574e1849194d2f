//! Handlers for the `/auth` resource (register, login, refresh, logout).

use axum::extract::State;
use axum::http::header::USER_AGENT;
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use chrono::Utc;
use cinema_core::error::CoreError;
use cinema_core::roles::ROLE_CUSTOMER;
use cinema_core::types::DbId;
use cinema_core::validation::validate_request;
use cinema_db::models::user::{CreateUser, User};
use cinema_db::models::user_session::CreateUserSession;
use cinema_db::repositories::{RoleRepo, UserRepo, UserSessionRepo};
use cinema_events::{DomainEvent, EventKind};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::auth::jwt::{generate_access_token, generate_refresh_token, hash_refresh_token};
use crate::auth::password::{hash_password, validate_password_strength, verify_password};
use crate::error::{is_unique_violation, AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

/// Consecutive wrong passwords that lock an account.
pub const MAX_FAILED_ATTEMPTS: i32 = 5;

pub const LOCK_DURATION_MINS: i64 = 15;

/// Longest user agent string kept on a login session.
const MAX_USER_AGENT_LEN: usize = 512;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /auth/register`.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 100))]
    pub first_name: String,
    #[validate(length(min = 1, max = 100))]
    pub last_name: String,
    #[validate(email)]
    pub email: String,
    pub password: String,
}

/// Request body for `POST /auth/login`.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Request body for `POST /auth/refresh`.
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Token pair issued by register, login and refresh.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub refresh_token: String,
    /// Access token lifetime in seconds.
    pub expires_in: i64,
    pub user: UserInfo,
}

/// Public user info embedded in [`AuthResponse`].
#[derive(Debug, Serialize)]
pub struct UserInfo {
    pub id: DbId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub role: String,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/auth/register
///
/// Open a customer account and sign it in. Returns 201 with a token pair.
pub async fn register(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(input): Json<RegisterRequest>,
) -> AppResult<(StatusCode, Json<AuthResponse>)> {
    validate_request(&input)?;
    validate_password_strength(&input.password).map_err(AppError::validation)?;

    let customer_role = RoleRepo::find_by_name(&state.pool, ROLE_CUSTOMER)
        .await?
        .ok_or_else(|| AppError::InternalError("Customer role is not seeded".into()))?;

    let password_hash = hash_password(&input.password)
        .map_err(|e| AppError::InternalError(format!("Password hashing error: {e}")))?;

    let new_user = CreateUser {
        first_name: input.first_name.trim().to_string(),
        last_name: input.last_name.trim().to_string(),
        email: input.email.trim().to_string(),
        password_hash,
        role_id: customer_role.id,
    };
    let user = UserRepo::create(&state.pool, &new_user).await.map_err(|e| {
        if is_unique_violation(&e, "uq_users_email") {
            AppError::conflict("An account with this email already exists")
        } else {
            AppError::Database(e)
        }
    })?;

    tracing::info!(user_id = user.id, "Customer registered");
    state
        .event_bus
        .publish(DomainEvent::new(EventKind::UserRegistered, user.id).by(user.id));

    let tokens = start_session(&state, &user, &customer_role.name, &headers).await?;
    Ok((StatusCode::CREATED, Json(tokens)))
}

/// POST /api/v1/auth/login
///
/// Unknown emails and wrong passwords get the same 401. After
/// [`MAX_FAILED_ATTEMPTS`] wrong passwords in a row the account is refused
/// with 403 for [`LOCK_DURATION_MINS`] minutes.
pub async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(input): Json<LoginRequest>,
) -> AppResult<Json<AuthResponse>> {
    let user = UserRepo::find_by_email(&state.pool, &input.email)
        .await?
        .ok_or_else(invalid_credentials)?;

    ensure_active(&user)?;
    if user.is_locked(Utc::now()) {
        return Err(AppError::Core(CoreError::Forbidden(
            "Account is temporarily locked. Try again later.".into(),
        )));
    }

    let password_ok = verify_password(&input.password, &user.password_hash)
        .map_err(|e| AppError::InternalError(format!("Password verification error: {e}")))?;
    if !password_ok {
        let lock_until = Utc::now() + chrono::Duration::minutes(LOCK_DURATION_MINS);
        let locked =
            UserRepo::record_failed_login(&state.pool, user.id, MAX_FAILED_ATTEMPTS, lock_until)
                .await?;
        if locked {
            tracing::warn!(user_id = user.id, "Account locked after repeated failed logins");
        }
        return Err(invalid_credentials());
    }

    UserRepo::record_successful_login(&state.pool, user.id).await?;
    let role = RoleRepo::resolve_name(&state.pool, user.role_id).await?;
    Ok(Json(start_session(&state, &user, &role, &headers).await?))
}

/// POST /api/v1/auth/refresh
///
/// Trade a refresh token for a new pair. Each refresh token is single use:
/// the old session is revoked in the same transaction that stores the new one.
pub async fn refresh(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(input): Json<RefreshRequest>,
) -> AppResult<Json<AuthResponse>> {
    let stale = || {
        AppError::Core(CoreError::Unauthorized(
            "Invalid or expired refresh token".into(),
        ))
    };

    let token_hash = hash_refresh_token(&input.refresh_token);
    let session = UserSessionRepo::find_by_refresh_token_hash(&state.pool, &token_hash)
        .await?
        .ok_or_else(stale)?;

    let user = UserRepo::find_by_id(&state.pool, session.user_id)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::Unauthorized("User no longer exists".into())))?;
    ensure_active(&user)?;

    let role = RoleRepo::resolve_name(&state.pool, user.role_id).await?;
    let (tokens, next) = mint_tokens(&state, &user, &role, &headers)?;
    // `None` means a concurrent refresh already spent this token.
    if UserSessionRepo::rotate(&state.pool, session.id, &next).await?.is_none() {
        return Err(stale());
    }
    Ok(Json(tokens))
}

/// POST /api/v1/auth/logout
///
/// Revoke every refresh token of the caller. Returns 204.
pub async fn logout(State(state): State<AppState>, caller: AuthUser) -> AppResult<StatusCode> {
    let revoked = UserSessionRepo::revoke_all_for_user(&state.pool, caller.user_id).await?;
    tracing::debug!(user_id = caller.user_id, revoked, "User logged out");
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn invalid_credentials() -> AppError {
    AppError::Core(CoreError::Unauthorized("Invalid email or password".into()))
}

fn ensure_active(user: &User) -> AppResult<()> {
    if user.is_active {
        Ok(())
    } else {
        Err(AppError::Core(CoreError::Forbidden(
            "Account is deactivated".into(),
        )))
    }
}

fn user_agent(headers: &HeaderMap) -> Option<String> {
    let agent = headers.get(USER_AGENT)?.to_str().ok()?.trim();
    if agent.is_empty() {
        return None;
    }
    Some(agent.chars().take(MAX_USER_AGENT_LEN).collect())
}

/// First hop of `X-Forwarded-For`, as set by the reverse proxy.
fn forwarded_for(headers: &HeaderMap) -> Option<String> {
    let first = headers.get("x-forwarded-for")?.to_str().ok()?.split(',').next()?.trim();
    first.parse::<std::net::IpAddr>().ok().map(|ip| ip.to_string())
}

/// Mint a token pair for `user` and persist its refresh token as a new
/// login session.
async fn start_session(
    state: &AppState,
    user: &User,
    role: &str,
    headers: &HeaderMap,
) -> AppResult<AuthResponse> {
    let (tokens, session) = mint_tokens(state, user, role, headers)?;
    UserSessionRepo::create(&state.pool, &session).await?;
    Ok(tokens)
}

/// Sign an access token and draw a refresh token. The returned session row
/// is not stored yet.
fn mint_tokens(
    state: &AppState,
    user: &User,
    role: &str,
    headers: &HeaderMap,
) -> AppResult<(AuthResponse, CreateUserSession)> {
    let jwt = &state.config.jwt;
    let access_token = generate_access_token(user.id, role, jwt)
        .map_err(|e| AppError::InternalError(format!("Token generation error: {e}")))?;
    let (refresh_token, refresh_token_hash) = generate_refresh_token();

    let session = CreateUserSession {
        user_id: user.id,
        refresh_token_hash,
        expires_at: Utc::now() + chrono::Duration::days(jwt.refresh_token_expiry_days),
        user_agent: user_agent(headers),
        ip_address: forwarded_for(headers),
    };
    let tokens = AuthResponse {
        access_token,
        refresh_token,
        expires_in: jwt.access_token_ttl_secs(),
        user: UserInfo {
            id: user.id,
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            email: user.email.clone(),
            role: role.to_string(),
        },
    };
    Ok((tokens, session))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn user_agent_is_trimmed_and_capped() {
        let mut headers = HeaderMap::new();
        assert_eq!(user_agent(&headers), None);

        headers.insert(USER_AGENT, HeaderValue::from_static("  curl/8.5  "));
        assert_eq!(user_agent(&headers).as_deref(), Some("curl/8.5"));

        let long = "x".repeat(MAX_USER_AGENT_LEN + 10);
        headers.insert(USER_AGENT, HeaderValue::from_str(&long).unwrap());
        assert_eq!(user_agent(&headers).map(|a| a.len()), Some(MAX_USER_AGENT_LEN));
    }

    #[test]
    fn forwarded_for_takes_the_client_hop() {
        let mut headers = HeaderMap::new();
        assert_eq!(forwarded_for(&headers), None);

        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("203.0.113.7, 10.0.0.1"),
        );
        assert_eq!(forwarded_for(&headers).as_deref(), Some("203.0.113.7"));

        headers.insert("x-forwarded-for", HeaderValue::from_static("not-an-ip"));
        assert_eq!(forwarded_for(&headers), None);
    }

    #[test]
    fn blank_user_agent_is_dropped() {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static("   "));
        assert_eq!(user_agent(&headers), None);
    }
}
