//! Shared test helpers for API integration tests.
#![allow(dead_code)]

use std::sync::Arc;

use arena_api::routes;
use arena_api::state::AppState;
use arena_core::clock::Clock;
use arena_core::notification::ForfeitNotifier;
use arena_event_store::pg_event_repository::PgEventRepository;
use arena_test_support::{FixedClock, RecordingNotifier};
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use sqlx::PgPool;
use tower::ServiceExt;

/// Build the full app router with a real `PgEventRepository` and the
/// reference clock. Uses the same route tree as `main.rs`.
pub fn build_test_app(pool: PgPool) -> Router {
    build_test_app_at(pool, FixedClock::reference())
}

/// Build the full app router with a specific clock, for tests that need
/// time to pass between requests.
pub fn build_test_app_at(pool: PgPool, clock: FixedClock) -> Router {
    let clock: Arc<dyn Clock> = Arc::new(clock);
    let notifier: Arc<dyn ForfeitNotifier> = Arc::new(RecordingNotifier::new());
    let event_repository = Arc::new(PgEventRepository::new(pool.clone()));
    let app_state = AppState::new(pool, clock, event_repository, notifier);

    routes::api_router().with_state(app_state)
}

/// Send a POST request with a JSON body and return the response.
pub async fn post_json(
    app: Router,
    uri: &str,
    body: &serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(body).unwrap()))
        .unwrap();

    read(app, request).await
}

/// Send a POST request without a body and return the response.
pub async fn post_empty(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .body(Body::empty())
        .unwrap();

    read(app, request).await
}

/// Send a GET request and return the response.
pub async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap();

    read(app, request).await
}

/// POST and return the `aggregate_id` of a successful command.
pub async fn create(pool: &PgPool, uri: &str, body: &serde_json::Value) -> String {
    let (status, json) = post_json(build_test_app(pool.clone()), uri, body).await;
    assert_eq!(status, StatusCode::OK, "{uri}: {json}");
    json["aggregate_id"].as_str().unwrap().to_owned()
}

/// Create a template, register a location with it assigned, and activate it.
/// Returns `(template_id, location_id)`.
pub async fn ready_location(pool: &PgPool, mode: &str) -> (String, String) {
    let template_id = create(
        pool,
        "/api/v1/templates",
        &serde_json::json!({ "name": "Laser Maze", "mode": mode }),
    )
    .await;
    let location_id = create(
        pool,
        "/api/v1/locations",
        &serde_json::json!({ "name": "North Hall" }),
    )
    .await;
    let (status, _) = post_json(
        build_test_app(pool.clone()),
        &format!("/api/v1/locations/{location_id}/assign-template"),
        &serde_json::json!({ "template_id": template_id }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = post_empty(
        build_test_app(pool.clone()),
        &format!("/api/v1/locations/{location_id}/activate"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    (template_id, location_id)
}

async fn read(app: Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = if body_bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&body_bytes).unwrap()
    };

    (status, json)
}
