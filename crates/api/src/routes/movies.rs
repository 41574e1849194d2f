//! Route definitions for the `/movies` resource.

use axum::routing::get;
use axum::Router;

use crate::handlers::movies;
use crate::state::AppState;

/// Routes mounted at `/movies`.
///
/// ```text
/// GET    /                -> list (?category_id, search, include_inactive)
/// POST   /                -> create (admin)
/// GET    /{id}            -> get_by_id
/// PUT    /{id}            -> update (admin)
/// DELETE /{id}            -> delete (admin)
/// GET    /{id}/sessions   -> list_sessions (upcoming)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(movies::list).post(movies::create))
        .route(
            "/{id}",
            get(movies::get_by_id)
                .put(movies::update)
                .delete(movies::delete),
        )
        .route("/{id}/sessions", get(movies::list_sessions))
}
