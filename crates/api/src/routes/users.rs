//! Route definitions for the `/users` resource.

use axum::routing::{get, put};
use axum::Router;

use crate::handlers::users;
use crate::state::AppState;

/// Routes mounted at `/users`.
///
/// `/me` routes serve the caller; the rest require the `admin` role
/// (enforced by handler extractors).
///
/// ```text
/// GET    /me           -> get_me
/// PUT    /me           -> update_me
/// PUT    /me/password  -> change_password
/// GET    /             -> list_users
/// POST   /             -> create_user
/// GET    /{id}         -> get_user
/// PUT    /{id}         -> update_user
/// DELETE /{id}         -> deactivate_user
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/me", get(users::get_me).put(users::update_me))
        .route("/me/password", put(users::change_password))
        .route("/", get(users::list_users).post(users::create_user))
        .route(
            "/{id}",
            get(users::get_user)
                .put(users::update_user)
                .delete(users::deactivate_user),
        )
}
