//! Shared test helpers for API integration tests.
#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use tower::ServiceExt;

use foldstory_api::routes;
use foldstory_api::state::AppState;
use foldstory_core::clock::Clock;
use foldstory_core::repository::SessionRepository;
use foldstory_core::tokens::TokenSource;
use foldstory_session::domain::policy::EnginePolicy;
use foldstory_store::MemorySessionRepository;
use foldstory_test_support::{FixedClock, SequenceTokens};

/// Fixed timestamp used across all integration tests.
fn fixed_clock() -> Arc<dyn Clock> {
    Arc::new(FixedClock(
        chrono::TimeZone::with_ymd_and_hms(&chrono::Utc, 2026, 1, 15, 10, 0, 0).unwrap(),
    ))
}

/// Build the full app router with an in-memory repository and deterministic
/// clock/tokens. Uses the same route structure as `main.rs`. The router is
/// cloned per request, so one app shares state across a whole scenario.
pub fn build_test_app() -> Router {
    build_test_app_with_policy(EnginePolicy::default())
}

/// Build the full app router with a custom policy for tests that tune
/// rounds, voting, or expiry.
pub fn build_test_app_with_policy(policy: EnginePolicy) -> Router {
    let repository: Arc<dyn SessionRepository> = Arc::new(MemorySessionRepository::new());
    let tokens: Arc<Mutex<dyn TokenSource + Send>> =
        Arc::new(Mutex::new(SequenceTokens::default()));
    let app_state = AppState::new(repository, fixed_clock(), tokens, Arc::new(policy));

    Router::new()
        .merge(routes::health::router())
        .nest("/api/v1/sessions", routes::sessions::router())
        .with_state(app_state)
}

/// Send a POST request with a JSON body and return the response.
pub async fn post_json(
    app: &Router,
    uri: &str,
    body: &serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(body).unwrap()))
        .unwrap();

    send(app, request).await
}

/// Send a POST request with a JSON body and an `x-anon-token` header.
pub async fn post_json_as(
    app: &Router,
    uri: &str,
    anon_token: &str,
    body: &serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .header("x-anon-token", anon_token)
        .body(Body::from(serde_json::to_vec(body).unwrap()))
        .unwrap();

    send(app, request).await
}

/// Send a GET request and return the response.
pub async fn get_json(app: &Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap();

    send(app, request).await
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();

    (status, json)
}
