pub mod auth;
pub mod bookings;
pub mod categories;
pub mod cinemas;
pub mod events;
pub mod health;
pub mod movies;
pub mod payments;
pub mod rooms;
pub mod sessions;
pub mod users;

use axum::routing::post;
use axum::Router;

use crate::handlers;
use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /auth/register                               register (public)
/// /auth/login                                  login (public)
/// /auth/refresh                                refresh (public)
/// /auth/logout                                 logout (requires auth)
///
/// /users/me                                    own profile
/// /users/me/password                           change password
/// /users, /users/{id}                          user management (admin)
///
/// /categories, /categories/{id}                catalogue (writes: admin)
/// /movies, /movies/{id}, /movies/{id}/sessions
///
/// /cinemas, /cinemas/{id}, /cinemas/{id}/rooms venues (writes: admin)
/// /rooms/{id}, /rooms/{id}/seats
///
/// /sessions, /sessions/{id}, /sessions/{id}/seats   screenings + seat map
///
/// /payments/intent                             open a payment intent (customer)
/// /create-payment-intent                       alias of /payments/intent
/// /bookings, /bookings/me, /bookings/{id}      bookings
/// /bookings/{id}/cancel                        cancel and release seats
///
/// /events, /events/types                       event log (admin)
/// /events/{subject_type}/{subject_id}
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Authentication routes (register, login, refresh, logout).
        .nest("/auth", auth::router())
        // Own profile and admin user management.
        .nest("/users", users::router())
        // Catalogue.
        .nest("/categories", categories::router())
        .nest("/movies", movies::router())
        // Venues.
        .nest("/cinemas", cinemas::router())
        .nest("/rooms", rooms::router())
        // Screenings.
        .nest("/sessions", sessions::router())
        // Checkout.
        .nest("/payments", payments::router())
        .route(
            "/create-payment-intent",
            post(handlers::payments::create_intent),
        )
        .nest("/bookings", bookings::router())
        // Persisted event log.
        .nest("/events", events::router())
}
