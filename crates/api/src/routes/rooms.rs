//! Route definitions for the `/rooms` resource.

use axum::routing::get;
use axum::Router;

use crate::handlers::rooms;
use crate::state::AppState;

/// Routes mounted at `/rooms`.
///
/// ```text
/// GET    /{id}         -> get_by_id
/// PUT    /{id}         -> update (admin)
/// DELETE /{id}         -> delete (admin)
/// GET    /{id}/seats   -> list_seats
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/{id}",
            get(rooms::get_by_id).put(rooms::update).delete(rooms::delete),
        )
        .route("/{id}/seats", get(rooms::list_seats))
}
