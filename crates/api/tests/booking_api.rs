//! End-to-end checkout tests: seat map, payment intent, booking
//! confirmation, double-booking protection and cancellation.
//!
//! Require a PostgreSQL server reachable through `DATABASE_URL`:
//! `cargo test -p cinema-api -- --ignored`.

mod common;

use std::sync::Arc;

use axum::http::StatusCode;
use chrono::{Duration, Utc};
use common::{body_json, get_auth, post_json_auth, token_for, TestApp};
use serde_json::{json, Value};
use sqlx::PgPool;

use cinema_api::payments::{MockPaymentProvider, PaymentStatus};
use cinema_core::seating::generate_layout;
use cinema_core::types::DbId;
use cinema_db::models::cinema::CreateCinema;
use cinema_db::models::movie::CreateMovie;
use cinema_db::models::room::CreateRoom;
use cinema_db::models::session::NewSession;
use cinema_db::models::user::CreateUser;
use cinema_db::repositories::{CinemaRepo, MovieRepo, RoomRepo, SeatRepo, SessionRepo, UserRepo};
use cinema_events::{EventKind, EventRecorder};

const PRICE_CENTS: i64 = 950;

/// Ids of the fixture rows.
struct Fixture {
    session_id: DbId,
    room_id: DbId,
    seat_ids: Vec<DbId>,
    alice: DbId,
    bob: DbId,
    admin: DbId,
}

async fn create_user(pool: &PgPool, email: &str, role_id: i64) -> DbId {
    UserRepo::create(
        pool,
        &CreateUser {
            first_name: "Test".into(),
            last_name: email.split('@').next().unwrap().into(),
            email: email.into(),
            password_hash: "not-used".into(),
            role_id,
        },
    )
    .await
    .unwrap()
    .id
}

/// A movie showing in a 3x4 room, starting in `starts_in`.
async fn seed(pool: &PgPool, starts_in: Duration) -> Fixture {
    let movie = MovieRepo::create(
        pool,
        &CreateMovie {
            title: "Night of the Living Code".into(),
            description: None,
            director: None,
            duration_minutes: 100,
            release_date: None,
            poster_url: None,
            trailer_url: None,
            age_rating: Some("PG-13".into()),
            category_ids: vec![],
        },
    )
    .await
    .unwrap();
    let cinema = CinemaRepo::create(
        pool,
        &CreateCinema {
            name: "Rialto".into(),
            address: "1 Main St".into(),
            city: "Porto".into(),
            phone: None,
        },
    )
    .await
    .unwrap();
    let room_input = CreateRoom {
        name: "Screen 1".into(),
        row_count: 3,
        seats_per_row: 4,
    };
    let layout = generate_layout(3, 4).unwrap();
    let room = RoomRepo::create(pool, cinema.id, &room_input, &layout)
        .await
        .unwrap();

    let starts_at = Utc::now() + starts_in;
    let session = SessionRepo::create(
        pool,
        &NewSession {
            movie_id: movie.id,
            room_id: room.id,
            starts_at,
            ends_at: starts_at + Duration::minutes(115),
            price_cents: PRICE_CENTS,
            currency: "usd".into(),
        },
    )
    .await
    .unwrap();

    let seat_ids = SeatRepo::list_by_room(pool, room.id)
        .await
        .unwrap()
        .into_iter()
        .map(|s| s.id)
        .collect();

    Fixture {
        session_id: session.id,
        room_id: room.id,
        seat_ids,
        alice: create_user(pool, "alice@example.com", 2).await,
        bob: create_user(pool, "bob@example.com", 2).await,
        admin: create_user(pool, "admin@example.com", 1).await,
    }
}

async fn open_intent(app: &TestApp, token: &str, session_id: DbId, seats: &[DbId]) -> (StatusCode, Value) {
    let response = post_json_auth(
        app.app(),
        "/api/v1/payments/intent",
        json!({ "session_id": session_id, "seat_ids": seats }),
        token,
    )
    .await;
    let status = response.status();
    (status, body_json(response).await)
}

async fn book(app: &TestApp, token: &str, session_id: DbId, seats: &[DbId], intent: &str) -> (StatusCode, Value) {
    let response = post_json_auth(
        app.app(),
        "/api/v1/bookings",
        json!({ "session_id": session_id, "seat_ids": seats, "payment_intent_id": intent }),
        token,
    )
    .await;
    let status = response.status();
    (status, body_json(response).await)
}

async fn booked_count(app: &TestApp, session_id: DbId) -> usize {
    let response = common::get(app.app(), &format!("/api/v1/sessions/{session_id}/seats")).await;
    assert_eq!(response.status(), StatusCode::OK);
    body_json(response).await["data"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|s| s["is_booked"] == true)
        .count()
}

// ---------------------------------------------------------------------------
// Happy path
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn customer_pays_and_books_seats(pool: PgPool) {
    let fx = seed(&pool, Duration::days(2)).await;
    let app = common::build_test_app_with(pool, Arc::new(MockPaymentProvider::new()));
    let mut events = app.event_bus.subscribe();
    let alice = token_for(fx.alice, "customer");
    let seats = [fx.seat_ids[0], fx.seat_ids[1]];

    assert_eq!(booked_count(&app, fx.session_id).await, 0);

    let (status, intent) = open_intent(&app, &alice, fx.session_id, &seats).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(intent["amount_cents"], 2 * PRICE_CENTS);
    assert_eq!(intent["currency"], "usd");
    assert!(intent["client_secret"].is_string());
    let intent_id = intent["payment_intent_id"].as_str().unwrap();

    let (status, booking) = book(&app, &alice, fx.session_id, &seats, intent_id).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(booking["status"], "confirmed");
    assert_eq!(booking["total_cents"], 2 * PRICE_CENTS);
    assert_eq!(booking["seats"].as_array().unwrap().len(), 2);
    assert_eq!(booking["reference"].as_str().unwrap().len(), 8);
    assert_eq!(booking["movie_title"], "Night of the Living Code");

    assert_eq!(booked_count(&app, fx.session_id).await, 2);

    let event = events.try_recv().expect("booking.confirmed should be published");
    assert_eq!(event.kind, EventKind::BookingConfirmed);
    assert_eq!(event.payload["email"], "alice@example.com");
    assert_eq!(event.payload["seats"], json!(["A1", "A2"]));

    let response = get_auth(app.app(), "/api/v1/bookings/me", &alice).await;
    assert_eq!(body_json(response).await["data"].as_array().unwrap().len(), 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn payment_intent_cannot_be_reused(pool: PgPool) {
    let fx = seed(&pool, Duration::days(2)).await;
    let app = common::build_test_app_with(pool, Arc::new(MockPaymentProvider::new()));
    let alice = token_for(fx.alice, "customer");
    let seats = [fx.seat_ids[0]];

    let (_, intent) = open_intent(&app, &alice, fx.session_id, &seats).await;
    let intent_id = intent["payment_intent_id"].as_str().unwrap();
    let (status, _) = book(&app, &alice, fx.session_id, &seats, intent_id).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = book(&app, &alice, fx.session_id, &[fx.seat_ids[5]], intent_id).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

// ---------------------------------------------------------------------------
// Payment verification
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn unpaid_intent_is_402_until_it_succeeds(pool: PgPool) {
    let fx = seed(&pool, Duration::days(2)).await;
    let provider = Arc::new(MockPaymentProvider::with_initial_status(
        PaymentStatus::RequiresPaymentMethod,
    ));
    let app = common::build_test_app_with(pool, Arc::clone(&provider));
    let alice = token_for(fx.alice, "customer");
    let seats = [fx.seat_ids[3]];

    let (_, intent) = open_intent(&app, &alice, fx.session_id, &seats).await;
    let intent_id = intent["payment_intent_id"].as_str().unwrap();

    let (status, body) = book(&app, &alice, fx.session_id, &seats, intent_id).await;
    assert_eq!(status, StatusCode::PAYMENT_REQUIRED);
    assert_eq!(body["code"], "PAYMENT_FAILED");

    assert!(provider.set_status(intent_id, PaymentStatus::Succeeded).await);
    let (status, _) = book(&app, &alice, fx.session_id, &seats, intent_id).await;
    assert_eq!(status, StatusCode::CREATED);
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn intent_must_match_the_booked_selection(pool: PgPool) {
    let fx = seed(&pool, Duration::days(2)).await;
    let app = common::build_test_app_with(pool, Arc::new(MockPaymentProvider::new()));
    let alice = token_for(fx.alice, "customer");
    let bob = token_for(fx.bob, "customer");

    let (_, intent) = open_intent(&app, &alice, fx.session_id, &[fx.seat_ids[0]]).await;
    let intent_id = intent["payment_intent_id"].as_str().unwrap();

    // Same price, different seat.
    let (status, _) = book(&app, &alice, fx.session_id, &[fx.seat_ids[1]], intent_id).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Someone else's payment.
    let (status, _) = book(&app, &bob, fx.session_id, &[fx.seat_ids[0]], intent_id).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = book(&app, &alice, fx.session_id, &[fx.seat_ids[0]], "pi_unknown").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn declined_payment_is_402(pool: PgPool) {
    let fx = seed(&pool, Duration::days(2)).await;
    let app = common::build_test_app_with(pool, Arc::new(MockPaymentProvider::declining()));
    let alice = token_for(fx.alice, "customer");

    let (status, body) = open_intent(&app, &alice, fx.session_id, &[fx.seat_ids[0]]).await;
    assert_eq!(status, StatusCode::PAYMENT_REQUIRED);
    assert_eq!(body["code"], "PAYMENT_FAILED");
}

// ---------------------------------------------------------------------------
// Seat conflicts
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn second_buyer_of_a_seat_gets_409(pool: PgPool) {
    let fx = seed(&pool, Duration::days(2)).await;
    let app = common::build_test_app_with(pool, Arc::new(MockPaymentProvider::new()));
    let alice = token_for(fx.alice, "customer");
    let bob = token_for(fx.bob, "customer");
    let seats = [fx.seat_ids[4]];

    // Both open an intent while the seat is still free.
    let (_, a) = open_intent(&app, &alice, fx.session_id, &seats).await;
    let (_, b) = open_intent(&app, &bob, fx.session_id, &seats).await;

    let (status, _) = book(&app, &alice, fx.session_id, &seats, a["payment_intent_id"].as_str().unwrap()).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = book(&app, &bob, fx.session_id, &seats, b["payment_intent_id"].as_str().unwrap()).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "CONFLICT");

    // New intents for a sold seat are refused up front.
    let (status, _) = open_intent(&app, &bob, fx.session_id, &seats).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn seats_from_another_room_are_rejected(pool: PgPool) {
    let fx = seed(&pool, Duration::days(2)).await;
    let other_room = RoomRepo::create(
        &pool,
        RoomRepo::find_by_id(&pool, fx.room_id).await.unwrap().unwrap().cinema_id,
        &CreateRoom {
            name: "Screen 2".into(),
            row_count: 1,
            seats_per_row: 2,
        },
        &generate_layout(1, 2).unwrap(),
    )
    .await
    .unwrap();
    let foreign_seat = SeatRepo::list_by_room(&pool, other_room.id).await.unwrap()[0].id;

    let app = common::build_test_app_with(pool, Arc::new(MockPaymentProvider::new()));
    let alice = token_for(fx.alice, "customer");
    let (status, _) = open_intent(&app, &alice, fx.session_id, &[foreign_seat]).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// ---------------------------------------------------------------------------
// Visibility and cancellation
// ---------------------------------------------------------------------------

async fn booked_by_alice(app: &TestApp, fx: &Fixture, seats: &[DbId]) -> DbId {
    let alice = token_for(fx.alice, "customer");
    let (_, intent) = open_intent(app, &alice, fx.session_id, seats).await;
    let (status, booking) = book(
        app,
        &alice,
        fx.session_id,
        seats,
        intent["payment_intent_id"].as_str().unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    booking["id"].as_i64().unwrap()
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn bookings_are_private_to_their_owner(pool: PgPool) {
    let fx = seed(&pool, Duration::days(2)).await;
    let app = common::build_test_app_with(pool, Arc::new(MockPaymentProvider::new()));
    let id = booked_by_alice(&app, &fx, &[fx.seat_ids[0]]).await;

    let bob = token_for(fx.bob, "customer");
    let response = get_auth(app.app(), &format!("/api/v1/bookings/{id}"), &bob).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let admin = token_for(fx.admin, "admin");
    let response = get_auth(app.app(), &format!("/api/v1/bookings/{id}"), &admin).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = get_auth(app.app(), "/api/v1/bookings?status=confirmed", &admin).await;
    assert_eq!(body_json(response).await["data"].as_array().unwrap().len(), 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn cancelling_releases_the_seats(pool: PgPool) {
    let fx = seed(&pool, Duration::days(2)).await;
    let app = common::build_test_app_with(pool, Arc::new(MockPaymentProvider::new()));
    let seats = [fx.seat_ids[0], fx.seat_ids[1]];
    let id = booked_by_alice(&app, &fx, &seats).await;
    let mut events = app.event_bus.subscribe();
    let alice = token_for(fx.alice, "customer");

    let response = post_json_auth(app.app(), &format!("/api/v1/bookings/{id}/cancel"), json!({}), &alice).await;
    assert_eq!(response.status(), StatusCode::OK);
    let booking = body_json(response).await;
    assert_eq!(booking["status"], "cancelled");
    assert!(booking["cancelled_at"].is_string());
    // The cancelled booking still lists what it held.
    assert_eq!(booking["seats"].as_array().unwrap().len(), 2);

    assert_eq!(booked_count(&app, fx.session_id).await, 0);
    let event = events.try_recv().expect("booking.cancelled should be published");
    assert_eq!(event.kind, EventKind::BookingCancelled);

    // Cancelling twice conflicts.
    let response = post_json_auth(app.app(), &format!("/api/v1/bookings/{id}/cancel"), json!({}), &alice).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // The seats can be sold again.
    booked_by_alice(&app, &fx, &seats).await;
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn late_cancellation_is_admin_only(pool: PgPool) {
    let fx = seed(&pool, Duration::minutes(30)).await;
    let app = common::build_test_app_with(pool, Arc::new(MockPaymentProvider::new()));
    let id = booked_by_alice(&app, &fx, &[fx.seat_ids[0]]).await;

    let alice = token_for(fx.alice, "customer");
    let response = post_json_auth(app.app(), &format!("/api/v1/bookings/{id}/cancel"), json!({}), &alice).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let admin = token_for(fx.admin, "admin");
    let response = post_json_auth(app.app(), &format!("/api/v1/bookings/{id}/cancel"), json!({}), &admin).await;
    assert_eq!(response.status(), StatusCode::OK);
}

// ---------------------------------------------------------------------------
// Scheduling
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn overlapping_sessions_and_sold_sessions_are_protected(pool: PgPool) {
    let fx = seed(&pool, Duration::days(2)).await;
    let existing = SessionRepo::find_by_id(&pool, fx.session_id).await.unwrap().unwrap();
    let app = common::build_test_app_with(pool, Arc::new(MockPaymentProvider::new()));
    let admin = token_for(fx.admin, "admin");

    let response = post_json_auth(
        app.app(),
        "/api/v1/sessions",
        json!({
            "movie_id": existing.movie_id,
            "room_id": fx.room_id,
            "starts_at": existing.starts_at + Duration::minutes(30),
            "price_cents": 1000,
        }),
        &admin,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // Right after the previous one ends is fine; ends_at is derived.
    let response = post_json_auth(
        app.app(),
        "/api/v1/sessions",
        json!({
            "movie_id": existing.movie_id,
            "room_id": fx.room_id,
            "starts_at": existing.ends_at,
            "price_cents": 1000,
            "currency": "EUR",
        }),
        &admin,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = body_json(response).await;
    assert_eq!(created["currency"], "eur");

    booked_by_alice(&app, &fx, &[fx.seat_ids[0]]).await;
    let response = common::delete_auth(app.app(), &format!("/api/v1/sessions/{}", fx.session_id), &admin).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn racing_admins_cannot_double_schedule_a_room(pool: PgPool) {
    let fx = seed(&pool, Duration::days(2)).await;
    let existing = SessionRepo::find_by_id(&pool, fx.session_id).await.unwrap().unwrap();
    let app = common::build_test_app_with(pool, Arc::new(MockPaymentProvider::new()));
    let admin = token_for(fx.admin, "admin");

    let body = json!({
        "movie_id": existing.movie_id,
        "room_id": fx.room_id,
        "starts_at": existing.ends_at + Duration::hours(1),
        "price_cents": 1000,
    });
    let (a, b) = tokio::join!(
        post_json_auth(app.app(), "/api/v1/sessions", body.clone(), &admin),
        post_json_auth(app.app(), "/api/v1/sessions", body.clone(), &admin),
    );

    let mut statuses = [a.status(), b.status()];
    statuses.sort();
    assert_eq!(statuses, [StatusCode::CREATED, StatusCode::CONFLICT]);

    let response = common::get(app.app(), &format!("/api/v1/movies/{}/sessions", existing.movie_id)).await;
    assert_eq!(body_json(response).await["data"].as_array().unwrap().len(), 2);
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn sold_sessions_cannot_be_rescheduled_or_repriced(pool: PgPool) {
    let fx = seed(&pool, Duration::days(2)).await;
    let app = common::build_test_app_with(pool, Arc::new(MockPaymentProvider::new()));
    let admin = token_for(fx.admin, "admin");
    let uri = format!("/api/v1/sessions/{}", fx.session_id);

    let response = common::put_json_auth(app.app(), &uri, json!({ "price_cents": 1200 }), &admin).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["price_cents"], 1200);

    booked_by_alice(&app, &fx, &[fx.seat_ids[0]]).await;

    let response = common::put_json_auth(app.app(), &uri, json!({ "price_cents": 1 }), &admin).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let response = common::get(app.app(), &uri).await;
    assert_eq!(body_json(response).await["price_cents"], 1200);
}

// ---------------------------------------------------------------------------
// Listings
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn seat_map_flags_each_booked_seat(pool: PgPool) {
    let fx = seed(&pool, Duration::days(2)).await;
    let app = common::build_test_app_with(pool, Arc::new(MockPaymentProvider::new()));
    let id = booked_by_alice(&app, &fx, &[fx.seat_ids[5]]).await;

    let uri = format!("/api/v1/sessions/{}/seats", fx.session_id);
    let seats = body_json(common::get(app.app(), &uri).await).await["data"].clone();
    let seats = seats.as_array().unwrap();
    assert_eq!(seats.len(), 12);
    let booked: Vec<&Value> = seats.iter().filter(|s| s["is_booked"] == true).collect();
    assert_eq!(booked.len(), 1);
    assert_eq!(booked[0]["id"], fx.seat_ids[5]);
    assert_eq!(booked[0]["label"], "B2");

    let alice = token_for(fx.alice, "customer");
    let response = post_json_auth(app.app(), &format!("/api/v1/bookings/{id}/cancel"), json!({}), &alice).await;
    assert_eq!(response.status(), StatusCode::OK);
    let seats = body_json(common::get(app.app(), &uri).await).await["data"].clone();
    assert!(seats.as_array().unwrap().iter().all(|s| s["is_booked"] == false));
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn movie_sessions_lists_upcoming_screenings_only(pool: PgPool) {
    let fx = seed(&pool, Duration::days(2)).await;
    let existing = SessionRepo::find_by_id(&pool, fx.session_id).await.unwrap().unwrap();
    let started_at = Utc::now() - Duration::days(2);
    SessionRepo::create(
        &pool,
        &NewSession {
            movie_id: existing.movie_id,
            room_id: fx.room_id,
            starts_at: started_at,
            ends_at: started_at + Duration::minutes(115),
            price_cents: PRICE_CENTS,
            currency: "usd".into(),
        },
    )
    .await
    .unwrap();
    let app = common::build_test_app(pool);

    let response = common::get(app, &format!("/api/v1/movies/{}/sessions", existing.movie_id)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let data = body_json(response).await["data"].clone();
    let data = data.as_array().unwrap();
    assert_eq!(data.len(), 1);
    assert_eq!(data[0]["id"], fx.session_id);
    assert_eq!(data[0]["room_name"], "Screen 1");
    assert_eq!(data[0]["cinema_name"], "Rialto");
    assert_eq!(data[0]["movie_title"], "Night of the Living Code");
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn legacy_intent_route_prices_the_selection(pool: PgPool) {
    let fx = seed(&pool, Duration::days(2)).await;
    let app = common::build_test_app_with(pool, Arc::new(MockPaymentProvider::new()));
    let body = json!({ "session_id": fx.session_id, "seat_ids": &fx.seat_ids[..3] });

    let response = common::post_json(app.app(), "/api/v1/create-payment-intent", body.clone()).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let alice = token_for(fx.alice, "customer");
    let response = post_json_auth(app.app(), "/api/v1/create-payment-intent", body, &alice).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let intent = body_json(response).await;
    assert_eq!(intent["amount_cents"], 3 * PRICE_CENTS);
    assert!(intent["payment_intent_id"].is_string());
}

// ---------------------------------------------------------------------------
// Event log
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn admins_read_the_recorded_event_log(pool: PgPool) {
    let fx = seed(&pool, Duration::days(2)).await;
    let app = common::build_test_app_with(pool.clone(), Arc::new(MockPaymentProvider::new()));
    let mut events = app.event_bus.subscribe();

    let id = booked_by_alice(&app, &fx, &[fx.seat_ids[0]]).await;
    let alice = token_for(fx.alice, "customer");
    let response = post_json_auth(app.app(), &format!("/api/v1/bookings/{id}/cancel"), json!({}), &alice).await;
    assert_eq!(response.status(), StatusCode::OK);

    while let Ok(event) = events.try_recv() {
        assert!(EventRecorder::record(&pool, &event).await.unwrap().is_some());
    }

    let admin = token_for(fx.admin, "admin");
    let response = get_auth(app.app(), "/api/v1/events", &alice).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = get_auth(app.app(), "/api/v1/events", &admin).await;
    assert_eq!(response.status(), StatusCode::OK);
    let recent = body_json(response).await["data"].clone();
    assert_eq!(recent.as_array().unwrap().len(), 2);
    assert_eq!(recent[0]["event_type"], "booking.cancelled");
    assert_eq!(recent[0]["actor_id"], fx.alice);

    let response = get_auth(app.app(), "/api/v1/events?type=booking.confirmed", &admin).await;
    let confirmed = body_json(response).await["data"].clone();
    assert_eq!(confirmed.as_array().unwrap().len(), 1);
    assert_eq!(confirmed[0]["subject_id"], id);

    let response = get_auth(app.app(), "/api/v1/events/types", &admin).await;
    let names: Vec<String> = body_json(response).await["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["name"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(
        names,
        ["booking.cancelled", "booking.confirmed", "session.created", "session.deleted", "user.registered"]
    );

    let response = get_auth(app.app(), &format!("/api/v1/events/booking/{id}"), &admin).await;
    let history: Vec<String> = body_json(response).await["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["event_type"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(history, ["booking.confirmed", "booking.cancelled"]);
}
