//! Shared test helpers for API integration tests.
#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use tower::ServiceExt;
use waitlist_core::event::Clock;
use waitlist_core::gateway::PersistenceGateway;
use waitlist_core::rng::DeterministicRng;
use waitlist_test_support::{FixedClock, RecordingNotifier, SeededRng};

use waitlist_api::build_router;
use waitlist_api::state::AppState;

/// Fixed timestamp used across all integration tests.
fn fixed_clock() -> Arc<dyn Clock> {
    Arc::new(FixedClock(
        chrono::TimeZone::with_ymd_and_hms(&chrono::Utc, 2026, 1, 15, 10, 0, 0).unwrap(),
    ))
}

/// Build the full app router over `gateway` with a seeded RNG. Uses the same
/// route structure as `main.rs`.
pub fn build_test_app(gateway: Arc<dyn PersistenceGateway>) -> Router {
    build_test_app_with_notifier(gateway, Arc::new(RecordingNotifier::new()))
}

/// Like [`build_test_app`], recording notifications into `notifier`.
pub fn build_test_app_with_notifier(
    gateway: Arc<dyn PersistenceGateway>,
    notifier: Arc<RecordingNotifier>,
) -> Router {
    let rng: Arc<Mutex<dyn DeterministicRng + Send>> = Arc::new(Mutex::new(SeededRng::new(42)));
    build_router(AppState::new(gateway, fixed_clock(), rng, notifier))
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();

    (status, json)
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

    send(app, request).await
}

/// Send a GET request and return the response.
pub async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap();

    send(app, request).await
}

/// Create an event through the API and return its id.
pub async fn create_event(app: Router, max_attendees: u32, sample_size: u32) -> String {
    let (status, json) = post_json(
        app,
        "/api/v1/events",
        &serde_json::json!({ "max_attendees": max_attendees, "sample_size": sample_size }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    json["event_id"].as_str().unwrap().to_owned()
}

/// Register `count` entrants named `user-{i}` through the API.
pub async fn register_entrants(app: &Router, event_id: &str, count: usize) {
    for i in 0..count {
        let (status, _) = post_json(
            app.clone(),
            &format!("/api/v1/events/{event_id}/entrants"),
            &serde_json::json!({
                "user_id": format!("user-{i}"),
                "user_name": format!("User {i}"),
                "user_email": format!("user{i}@example.com")
            }),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }
}
