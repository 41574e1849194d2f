//! Catalogue and venue CRUD through the HTTP API: categories, movies (with
//! their visibility rules), cinemas and rooms.
//!
//! Require a PostgreSQL server reachable through `DATABASE_URL`:
//! `cargo test -p cinema-api -- --ignored`.

mod common;

use axum::http::StatusCode;
use chrono::{Duration, Utc};
use common::{body_json, delete_auth, get, get_auth, post_json_auth, put_json_auth, token_for};
use serde_json::{json, Value};
use sqlx::PgPool;

use cinema_core::types::DbId;
use cinema_db::models::session::NewSession;
use cinema_db::models::user::CreateUser;
use cinema_db::repositories::{SessionRepo, UserRepo};

/// Tokens for a seeded admin and customer.
struct Callers {
    admin: String,
    customer: String,
}

async fn callers(pool: &PgPool) -> Callers {
    let mut ids = Vec::new();
    for (email, role_id) in [("admin@example.com", 1), ("carla@example.com", 2)] {
        let user = UserRepo::create(
            pool,
            &CreateUser {
                first_name: "Test".into(),
                last_name: "User".into(),
                email: email.into(),
                password_hash: "not-used".into(),
                role_id,
            },
        )
        .await
        .unwrap();
        ids.push(user.id);
    }
    Callers {
        admin: token_for(ids[0], "admin"),
        customer: token_for(ids[1], "customer"),
    }
}

fn data_len(body: &Value) -> usize {
    body["data"].as_array().map_or(0, Vec::len)
}

fn titles(body: &Value) -> Vec<String> {
    body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["title"].as_str().unwrap().to_string())
        .collect()
}

async fn created_id(response: axum::http::Response<axum::body::Body>) -> DbId {
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await["id"].as_i64().unwrap()
}

// ---------------------------------------------------------------------------
// Categories
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn categories_crud(pool: PgPool) {
    let who = callers(&pool).await;
    let app = common::build_test_app(pool);

    let response = post_json_auth(app.clone(), "/api/v1/categories", json!({ "name": "Horror" }), &who.customer).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let id = created_id(
        post_json_auth(app.clone(), "/api/v1/categories", json!({ "name": "Horror" }), &who.admin).await,
    )
    .await;
    let response = post_json_auth(app.clone(), "/api/v1/categories", json!({ "name": "Horror" }), &who.admin).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let response = post_json_auth(app.clone(), "/api/v1/categories", json!({ "name": "   " }), &who.admin).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = get(app.clone(), "/api/v1/categories").await;
    assert_eq!(data_len(&body_json(response).await), 1);

    let uri = format!("/api/v1/categories/{id}");
    let response = put_json_auth(app.clone(), &uri, json!({ "description": "Things that go bump" }), &who.admin).await;
    assert_eq!(response.status(), StatusCode::OK);
    let category = body_json(response).await;
    assert_eq!(category["name"], "Horror");
    assert_eq!(category["description"], "Things that go bump");

    let response = delete_auth(app.clone(), &uri, &who.admin).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let response = get(app.clone(), &uri).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let response = delete_auth(app, &uri, &who.admin).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ---------------------------------------------------------------------------
// Movies
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn movies_crud_with_categories(pool: PgPool) {
    let who = callers(&pool).await;
    let app = common::build_test_app(pool);

    let drama = created_id(post_json_auth(app.clone(), "/api/v1/categories", json!({ "name": "Drama" }), &who.admin).await).await;
    let comedy = created_id(post_json_auth(app.clone(), "/api/v1/categories", json!({ "name": "Comedy" }), &who.admin).await).await;

    let response = post_json_auth(
        app.clone(),
        "/api/v1/movies",
        json!({ "title": "Quiet Harbour", "duration_minutes": 118, "category_ids": [drama] }),
        &who.admin,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let movie = body_json(response).await;
    assert_eq!(movie["categories"][0]["name"], "Drama");
    assert_eq!(movie["is_active"], true);
    let id = movie["id"].as_i64().unwrap();

    let response = post_json_auth(
        app.clone(),
        "/api/v1/movies",
        json!({ "title": "Ghost Category", "duration_minutes": 90, "category_ids": [9_999] }),
        &who.admin,
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = post_json_auth(
        app.clone(),
        "/api/v1/movies",
        json!({ "title": "Zero Minutes", "duration_minutes": 0 }),
        &who.admin,
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = get(app.clone(), &format!("/api/v1/movies?category_id={drama}")).await;
    assert_eq!(titles(&body_json(response).await), ["Quiet Harbour"]);
    let response = get(app.clone(), &format!("/api/v1/movies?category_id={comedy}")).await;
    assert_eq!(data_len(&body_json(response).await), 0);

    // A present category list replaces the old one.
    let uri = format!("/api/v1/movies/{id}");
    let response = put_json_auth(
        app.clone(),
        &uri,
        json!({ "director": "R. Okafor", "category_ids": [comedy] }),
        &who.admin,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let movie = body_json(response).await;
    assert_eq!(movie["director"], "R. Okafor");
    assert_eq!(movie["categories"].as_array().unwrap().len(), 1);
    assert_eq!(movie["categories"][0]["name"], "Comedy");

    let response = delete_auth(app.clone(), &uri, &who.admin).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let response = get(app, &uri).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn search_treats_wildcards_literally(pool: PgPool) {
    let who = callers(&pool).await;
    let app = common::build_test_app(pool);
    for title in ["100% Love", "1000 Lives", "Snake_Case"] {
        created_id(
            post_json_auth(app.clone(), "/api/v1/movies", json!({ "title": title, "duration_minutes": 95 }), &who.admin).await,
        )
        .await;
    }

    let response = get(app.clone(), "/api/v1/movies?search=100%25").await;
    assert_eq!(titles(&body_json(response).await), ["100% Love"]);

    let response = get(app.clone(), "/api/v1/movies?search=e_c").await;
    assert_eq!(titles(&body_json(response).await), ["Snake_Case"]);

    let response = get(app.clone(), "/api/v1/movies?search=%25").await;
    assert_eq!(titles(&body_json(response).await), ["100% Love"]);

    let response = get(app, "/api/v1/movies?search=lives").await;
    assert_eq!(titles(&body_json(response).await), ["1000 Lives"]);
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn inactive_movies_are_visible_to_admins_only(pool: PgPool) {
    let who = callers(&pool).await;
    let app = common::build_test_app(pool);

    let shown = created_id(post_json_auth(app.clone(), "/api/v1/movies", json!({ "title": "Now Showing", "duration_minutes": 100 }), &who.admin).await).await;
    let hidden = created_id(post_json_auth(app.clone(), "/api/v1/movies", json!({ "title": "Withdrawn", "duration_minutes": 100 }), &who.admin).await).await;
    let response = put_json_auth(app.clone(), &format!("/api/v1/movies/{hidden}"), json!({ "is_active": false }), &who.admin).await;
    assert_eq!(body_json(response).await["is_active"], false);

    // include_inactive is ignored for anyone but admins.
    let response = get(app.clone(), "/api/v1/movies?include_inactive=true").await;
    assert_eq!(titles(&body_json(response).await), ["Now Showing"]);
    let response = get_auth(app.clone(), "/api/v1/movies?include_inactive=true", &who.customer).await;
    assert_eq!(titles(&body_json(response).await), ["Now Showing"]);
    let response = get_auth(app.clone(), "/api/v1/movies", &who.admin).await;
    assert_eq!(titles(&body_json(response).await), ["Now Showing"]);
    let response = get_auth(app.clone(), "/api/v1/movies?include_inactive=true", &who.admin).await;
    assert_eq!(data_len(&body_json(response).await), 2);

    for uri in [format!("/api/v1/movies/{hidden}"), format!("/api/v1/movies/{hidden}/sessions")] {
        let response = get(app.clone(), &uri).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{uri} anonymous");
        let response = get_auth(app.clone(), &uri, &who.customer).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{uri} customer");
        let response = get_auth(app.clone(), &uri, &who.admin).await;
        assert_eq!(response.status(), StatusCode::OK, "{uri} admin");
    }

    let response = get(app.clone(), &format!("/api/v1/movies/{shown}/sessions")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(data_len(&body_json(response).await), 0);
}

// ---------------------------------------------------------------------------
// Cinemas and rooms
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn cinemas_and_rooms_crud(pool: PgPool) {
    let who = callers(&pool).await;
    let app = common::build_test_app(pool.clone());

    let cinema = created_id(
        post_json_auth(
            app.clone(),
            "/api/v1/cinemas",
            json!({ "name": "Batalha", "address": "Praca da Batalha 47", "city": "Porto" }),
            &who.admin,
        )
        .await,
    )
    .await;
    let response = post_json_auth(
        app.clone(),
        "/api/v1/cinemas",
        json!({ "name": "Batalha", "address": "Elsewhere 1", "city": "Porto" }),
        &who.admin,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = get(app.clone(), "/api/v1/cinemas?city=porto").await;
    assert_eq!(data_len(&body_json(response).await), 1);
    let response = get(app.clone(), "/api/v1/cinemas?city=Lisbon").await;
    assert_eq!(data_len(&body_json(response).await), 0);

    let cinema_uri = format!("/api/v1/cinemas/{cinema}");
    let response = put_json_auth(app.clone(), &cinema_uri, json!({ "phone": "+351 222 000 000" }), &who.admin).await;
    assert_eq!(body_json(response).await["phone"], "+351 222 000 000");

    // Rooms and their generated seats.
    let rooms_uri = format!("{cinema_uri}/rooms");
    let response = post_json_auth(app.clone(), &rooms_uri, json!({ "name": "Sala 1", "row_count": 0, "seats_per_row": 3 }), &who.admin).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let response = post_json_auth(app.clone(), &rooms_uri, json!({ "name": "Sala 1", "row_count": 2, "seats_per_row": 3 }), &who.customer).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let room = created_id(
        post_json_auth(app.clone(), &rooms_uri, json!({ "name": "Sala 1", "row_count": 2, "seats_per_row": 3 }), &who.admin).await,
    )
    .await;
    let response = post_json_auth(app.clone(), &rooms_uri, json!({ "name": "Sala 1", "row_count": 1, "seats_per_row": 1 }), &who.admin).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = get(app.clone(), &rooms_uri).await;
    assert_eq!(data_len(&body_json(response).await), 1);

    let room_uri = format!("/api/v1/rooms/{room}");
    let response = get(app.clone(), &format!("{room_uri}/seats")).await;
    let labels: Vec<String> = body_json(response).await["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["label"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(labels, ["A1", "A2", "A3", "B1", "B2", "B3"]);

    let response = put_json_auth(app.clone(), &room_uri, json!({ "name": "Sala Grande" }), &who.admin).await;
    let renamed = body_json(response).await;
    assert_eq!(renamed["name"], "Sala Grande");
    assert_eq!(renamed["row_count"], 2);

    // A scheduled session pins the room and its cinema.
    let movie = created_id(post_json_auth(app.clone(), "/api/v1/movies", json!({ "title": "Pinned", "duration_minutes": 80 }), &who.admin).await).await;
    let starts_at = Utc::now() + Duration::days(3);
    let session = SessionRepo::create(
        &pool,
        &NewSession {
            movie_id: movie,
            room_id: room,
            starts_at,
            ends_at: starts_at + Duration::minutes(95),
            price_cents: 700,
            currency: "eur".into(),
        },
    )
    .await
    .unwrap();

    let response = delete_auth(app.clone(), &room_uri, &who.admin).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let response = delete_auth(app.clone(), &cinema_uri, &who.admin).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let response = delete_auth(app.clone(), &format!("/api/v1/movies/{movie}"), &who.admin).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = delete_auth(app.clone(), &format!("/api/v1/sessions/{}", session.id), &who.admin).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let response = delete_auth(app.clone(), &room_uri, &who.admin).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let response = get(app.clone(), &room_uri).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = delete_auth(app.clone(), &cinema_uri, &who.admin).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let response = get(app, &cinema_uri).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
