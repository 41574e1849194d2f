//! Route definitions for the `/events` resource (admin only).

use axum::routing::get;
use axum::Router;

use crate::handlers::events;
use crate::state::AppState;

/// Routes mounted at `/events`.
///
/// ```text
/// GET /                             -> list_recent
/// GET /types                        -> list_types
/// GET /{subject_type}/{subject_id}  -> list_for_subject
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(events::list_recent))
        .route("/types", get(events::list_types))
        .route("/{subject_type}/{subject_id}", get(events::list_for_subject))
}
