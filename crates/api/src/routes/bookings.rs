//! Route definitions for the `/bookings` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::bookings;
use crate::state::AppState;

/// Routes mounted at `/bookings`.
///
/// ```text
/// POST /              -> create (customer, after payment)
/// GET  /              -> list_all (admin)
/// GET  /me            -> list_mine
/// GET  /{id}          -> get_by_id (owner or admin)
/// POST /{id}/cancel   -> cancel (owner or admin)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(bookings::list_all).post(bookings::create))
        .route("/me", get(bookings::list_mine))
        .route("/{id}", get(bookings::get_by_id))
        .route("/{id}/cancel", post(bookings::cancel))
}
