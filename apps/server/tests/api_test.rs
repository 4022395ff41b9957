//! End-to-end tests for the HTTP surface.
//!
//! These drive the full router (guards included) over the in-memory store,
//! so no database file is required.

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use parkhub_server::{bootstrap, config::Config, create_app, create_state};
use parking_store::MemoryParkingStore;
use serde_json::Value;
use tower::ServiceExt;

const ADMIN_PASSWORD: &str = "admin123";

fn test_config() -> Config {
    Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        database_url: "sqlite::memory:".to_string(),
        session_secret: "test-session-secret-long-enough".to_string(),
        session_expiration_hours: 24,
        admin_password: ADMIN_PASSWORD.to_string(),
        log_level: "info".to_string(),
    }
}

async fn test_app() -> Router {
    let store = MemoryParkingStore::new();
    bootstrap::ensure_admin(&store, ADMIN_PASSWORD).await.unwrap();
    create_app(create_state(test_config(), store))
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = serde_json::from_slice(&bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).to_string()));
    (status, json)
}

fn form_post(uri: &str, token: Option<&str>, body: &str) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

fn error_code(body: &Value) -> &str {
    body["error"]["code"].as_str().unwrap_or("")
}

async fn register(app: &Router, username: &str) -> (StatusCode, Value) {
    let body = format!(
        "username={username}&email={username}%40example.com&password=secret123&phone=5550001"
    );
    send(app, form_post("/api/auth/register", None, &body)).await
}

async fn login_token(app: &Router, username: &str, password: &str) -> String {
    let body = format!("username={username}&password={password}");
    let (status, body) = send(app, form_post("/api/auth/login", None, &body)).await;
    assert_eq!(status, StatusCode::OK);
    body["token"].as_str().unwrap().to_string()
}

async fn create_lot(app: &Router, token: &str, name: &str, price: f64, spots: u32) -> String {
    let body = format!(
        "name={name}&address=1+Main+Street&pin_code=560001&price_per_hour={price}&max_spots={spots}"
    );
    let (status, body) = send(app, form_post("/api/admin/lots", Some(token), &body)).await;
    assert_eq!(status, StatusCode::OK);
    body["lot"]["id"].as_str().unwrap().to_string()
}

async fn book(app: &Router, token: &str, lot_id: &str, vehicle: &str) -> (StatusCode, Value) {
    send(
        app,
        form_post(
            &format!("/api/user/lots/{lot_id}/book"),
            Some(token),
            &format!("vehicle_number={vehicle}"),
        ),
    )
    .await
}

async fn release(app: &Router, token: &str, reservation_id: &str) -> (StatusCode, Value) {
    send(
        app,
        form_post(
            &format!("/api/user/reservations/{reservation_id}/release"),
            Some(token),
            "",
        ),
    )
    .await
}

#[tokio::test]
async fn health_check_works() {
    let app = test_app().await;
    let (status, body) = send(&app, get("/health", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::String("OK".to_string()));
}

#[tokio::test]
async fn register_rejects_duplicates() {
    let app = test_app().await;

    let (status, _) = register(&app, "alice").await;
    assert_eq!(status, StatusCode::OK);

    // Same username, different email.
    let body = "username=alice&email=other%40example.com&password=secret123";
    let (status, body) = send(&app, form_post("/api/auth/register", None, body)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(error_code(&body), "DUPLICATE_USERNAME");

    // Different username, same email.
    let body = "username=alice2&email=alice%40example.com&password=secret123";
    let (status, body) = send(&app, form_post("/api/auth/register", None, body)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(error_code(&body), "DUPLICATE_EMAIL");
}

#[tokio::test]
async fn login_checks_credentials() {
    let app = test_app().await;
    register(&app, "alice").await;

    let (status, body) = send(
        &app,
        form_post("/api/auth/login", None, "username=alice&password=wrong"),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(error_code(&body), "INVALID_CREDENTIALS");

    // Unknown users get the same answer as wrong passwords.
    let (status, body) = send(
        &app,
        form_post("/api/auth/login", None, "username=nobody&password=wrong"),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(error_code(&body), "INVALID_CREDENTIALS");

    let (status, body) = send(
        &app,
        form_post("/api/auth/login", None, "username=alice&password=secret123"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["token"].as_str().is_some_and(|t| !t.is_empty()));
    assert_eq!(body["user"]["username"], "alice");
    assert_eq!(body["user"]["is_admin"], false);
    assert!(body["user"]["password_hash"].is_null());
}

#[tokio::test]
async fn guards_enforce_session_and_role() {
    let app = test_app().await;
    register(&app, "alice").await;
    let member = login_token(&app, "alice", "secret123").await;

    // No token.
    let (status, body) = send(&app, get("/api/user/dashboard", None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(error_code(&body), "AUTHENTICATION_REQUIRED");

    // Garbage token.
    let (status, _) = send(&app, get("/api/user/dashboard", Some("not-a-token"))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Member on an admin route.
    let (status, body) = send(&app, get("/api/admin/dashboard", Some(&member))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(error_code(&body), "PERMISSION_DENIED");

    // The seeded admin passes both guards.
    let admin = login_token(&app, "admin", ADMIN_PASSWORD).await;
    let (status, body) = send(&app, get("/api/admin/dashboard", Some(&admin))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["stats"]["total_lots"], 0);

    // A session resolves to its own identity.
    let (status, body) = send(&app, get("/api/auth/me", Some(&member))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], "alice");
    assert_eq!(body["is_admin"], false);

    let (status, body) = send(&app, form_post("/api/auth/logout", Some(&member), "")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["message"].as_str().unwrap().contains("logged out"));
}

#[tokio::test]
async fn admin_lot_lifecycle() {
    let app = test_app().await;
    let admin = login_token(&app, "admin", ADMIN_PASSWORD).await;

    let lot_id = create_lot(&app, &admin, "Central+Plaza", 20.0, 2).await;

    let (status, body) = send(&app, get("/api/lots", None)).await;
    assert_eq!(status, StatusCode::OK);
    let lots = body.as_array().unwrap();
    assert_eq!(lots.len(), 1);
    assert_eq!(lots[0]["name"], "Central Plaza");
    assert_eq!(lots[0]["total_spots"], 2);
    assert_eq!(lots[0]["available_spots"], 2);
    assert_eq!(lots[0]["occupied_spots"], 0);

    // Grow the lot to 3 spots.
    let form = "name=Central+Plaza&address=1+Main+Street&pin_code=560001&price_per_hour=20&max_spots=3";
    let (status, body) = send(
        &app,
        form_post(&format!("/api/admin/lots/{lot_id}/update"), Some(&admin), form),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["lot"]["total_spots"], 3);
    assert_eq!(body["lot"]["available_spots"], 3);

    // Unknown lot is a distinct not-found answer.
    let missing = uuid::Uuid::new_v4();
    let (status, body) = send(
        &app,
        form_post(&format!("/api/admin/lots/{missing}/update"), Some(&admin), form),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error_code(&body), "RESOURCE_NOT_FOUND");

    let (status, body) = send(
        &app,
        form_post(&format!("/api/admin/lots/{lot_id}/delete"), Some(&admin), ""),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["message"].as_str().unwrap().contains("deleted"));

    let (_, body) = send(&app, get("/api/lots", None)).await;
    assert!(body.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn book_and_release_flow() {
    let app = test_app().await;
    let admin = login_token(&app, "admin", ADMIN_PASSWORD).await;
    let lot_id = create_lot(&app, &admin, "Central+Plaza", 20.0, 2).await;

    register(&app, "bob").await;
    register(&app, "carol").await;
    let bob = login_token(&app, "bob", "secret123").await;
    let carol = login_token(&app, "carol", "secret123").await;

    // Booking takes the first spot by number and upper-cases the vehicle.
    let (status, body) = book(&app, &bob, &lot_id, "ka-01-ab-1234").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["message"].as_str().unwrap().contains("S001"));
    assert_eq!(body["reservation"]["spot_number"], "S001");
    assert_eq!(body["reservation"]["vehicle_number"], "KA-01-AB-1234");
    let reservation_id = body["reservation"]["id"].as_str().unwrap().to_string();

    let (_, body) = send(&app, get("/api/lots", None)).await;
    assert_eq!(body[0]["available_spots"], 1);
    assert_eq!(body[0]["occupied_spots"], 1);

    // The spot listing shows the occupant.
    let (status, body) = send(&app, get(&format!("/api/lot/{lot_id}/spots"), None)).await;
    assert_eq!(status, StatusCode::OK);
    let spots = body.as_array().unwrap();
    assert_eq!(spots.len(), 2);
    assert_eq!(spots[0]["spot_number"], "S001");
    assert_eq!(spots[0]["status"], "occupied");
    assert_eq!(spots[0]["current_reservation"]["user"], "bob");
    assert_eq!(
        spots[0]["current_reservation"]["vehicle_number"],
        "KA-01-AB-1234"
    );
    assert!(spots[0]["current_reservation"]["duration"]
        .as_str()
        .unwrap()
        .contains("ongoing"));
    assert_eq!(spots[1]["status"], "available");
    assert!(spots[1]["current_reservation"].is_null());

    // Only the owner may release.
    let (status, body) = release(&app, &carol, &reservation_id).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(error_code(&body), "NOT_OWNER");

    // An immediate release still bills the one-hour minimum.
    let (status, body) = release(&app, &bob, &reservation_id).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["message"].as_str().unwrap().contains("Total cost"));
    assert_eq!(body["reservation"]["cost"], 20.0);
    assert!(!body["reservation"]["leaving_timestamp"].is_null());

    // The cost is fixed; releasing again is refused.
    let (status, body) = release(&app, &bob, &reservation_id).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(error_code(&body), "ALREADY_RELEASED");

    let (_, body) = send(&app, get("/api/lots", None)).await;
    assert_eq!(body[0]["available_spots"], 2);
    assert_eq!(body[0]["occupied_spots"], 0);
}

#[tokio::test]
async fn booking_a_full_lot_conflicts() {
    let app = test_app().await;
    let admin = login_token(&app, "admin", ADMIN_PASSWORD).await;
    let lot_id = create_lot(&app, &admin, "Tiny+Lot", 15.0, 1).await;

    register(&app, "bob").await;
    register(&app, "carol").await;
    let bob = login_token(&app, "bob", "secret123").await;
    let carol = login_token(&app, "carol", "secret123").await;

    let (status, _) = book(&app, &bob, &lot_id, "AAA111").await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = book(&app, &carol, &lot_id, "BBB222").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(error_code(&body), "NO_AVAILABLE_SPOT");

    // Booking an unknown lot is not-found, not a conflict.
    let missing = uuid::Uuid::new_v4();
    let (status, body) = book(&app, &carol, &missing.to_string(), "BBB222").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error_code(&body), "RESOURCE_NOT_FOUND");

    // Empty vehicle numbers are rejected before any allocation.
    let (status, body) = book(&app, &carol, &lot_id, "").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&body), "INVALID_REQUEST");
}

#[tokio::test]
async fn occupied_spots_block_shrink_and_delete() {
    let app = test_app().await;
    let admin = login_token(&app, "admin", ADMIN_PASSWORD).await;
    let lot_id = create_lot(&app, &admin, "Central+Plaza", 20.0, 2).await;

    register(&app, "bob").await;
    let bob = login_token(&app, "bob", "secret123").await;

    // Occupy S002 only: book both, release the first.
    let (_, body) = book(&app, &bob, &lot_id, "AAA111").await;
    let first = body["reservation"]["id"].as_str().unwrap().to_string();
    book(&app, &bob, &lot_id, "BBB222").await;
    release(&app, &bob, &first).await;

    let form = "name=Central+Plaza&address=1+Main+Street&pin_code=560001&price_per_hour=20&max_spots=1";
    let (status, body) = send(
        &app,
        form_post(&format!("/api/admin/lots/{lot_id}/update"), Some(&admin), form),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(error_code(&body), "OCCUPIED_SPOTS");

    // The blocked shrink changed nothing.
    let (_, body) = send(&app, get("/api/lots", None)).await;
    assert_eq!(body[0]["total_spots"], 2);

    let (status, body) = send(
        &app,
        form_post(&format!("/api/admin/lots/{lot_id}/delete"), Some(&admin), ""),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(error_code(&body), "OCCUPIED_SPOTS");
}

#[tokio::test]
async fn user_dashboard_tracks_reservations() {
    let app = test_app().await;
    let admin = login_token(&app, "admin", ADMIN_PASSWORD).await;
    let lot_id = create_lot(&app, &admin, "Central+Plaza", 20.0, 2).await;

    register(&app, "bob").await;
    let bob = login_token(&app, "bob", "secret123").await;

    let (_, body) = book(&app, &bob, &lot_id, "AAA111").await;
    let reservation_id = body["reservation"]["id"].as_str().unwrap().to_string();

    let (status, body) = send(&app, get("/api/user/dashboard", Some(&bob))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["current_reservations"].as_array().unwrap().len(), 1);
    assert!(body["past_reservations"].as_array().unwrap().is_empty());
    let current = &body["current_reservations"][0];
    assert_eq!(current["lot_name"], "Central Plaza");
    assert_eq!(current["spot_number"], "S001");
    assert!(current["duration"].as_str().unwrap().contains("ongoing"));
    // Live running estimate: the minimum charge applies from the start.
    assert_eq!(current["cost"], 20.0);

    release(&app, &bob, &reservation_id).await;

    let (_, body) = send(&app, get("/api/user/dashboard", Some(&bob))).await;
    assert!(body["current_reservations"].as_array().unwrap().is_empty());
    let past = body["past_reservations"].as_array().unwrap();
    assert_eq!(past.len(), 1);
    assert_eq!(past[0]["cost"], 20.0);
    assert!(!past[0]["duration"].as_str().unwrap().contains("ongoing"));
}
