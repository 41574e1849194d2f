//! Route definitions for the `/sessions` resource.

use axum::routing::get;
use axum::Router;

use crate::handlers::sessions;
use crate::state::AppState;

/// Routes mounted at `/sessions`.
///
/// ```text
/// GET    /              -> list (?movie_id, cinema_id, date, include_past)
/// POST   /              -> create (admin)
/// GET    /{id}          -> get_by_id
/// PUT    /{id}          -> update (admin)
/// DELETE /{id}          -> delete (admin)
/// GET    /{id}/seats    -> seat_map
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(sessions::list).post(sessions::create))
        .route(
            "/{id}",
            get(sessions::get_by_id)
                .put(sessions::update)
                .delete(sessions::delete),
        )
        .route("/{id}/seats", get(sessions::seat_map))
}
