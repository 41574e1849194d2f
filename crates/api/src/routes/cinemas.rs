//! Route definitions for the `/cinemas` resource.

use axum::routing::get;
use axum::Router;

use crate::handlers::cinemas;
use crate::state::AppState;

/// Routes mounted at `/cinemas`.
///
/// ```text
/// GET    /              -> list (?city)
/// POST   /              -> create (admin)
/// GET    /{id}          -> get_by_id
/// PUT    /{id}          -> update (admin)
/// DELETE /{id}          -> delete (admin)
/// GET    /{id}/rooms    -> list_rooms
/// POST   /{id}/rooms    -> create_room (admin)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(cinemas::list).post(cinemas::create))
        .route(
            "/{id}",
            get(cinemas::get_by_id)
                .put(cinemas::update)
                .delete(cinemas::delete),
        )
        .route(
            "/{id}/rooms",
            get(cinemas::list_rooms).post(cinemas::create_room),
        )
}
