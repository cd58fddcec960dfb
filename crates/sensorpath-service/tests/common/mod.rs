//! Shared helpers for driving the router in-process.

#![allow(dead_code)]

use std::path::PathBuf;

use axum::body::{to_bytes, Body};
use axum::http::{HeaderMap, Request, StatusCode};
use axum::Router;
use serde_json::Value;
use tower::ServiceExt;

use sensorpath_service::{router, AppState, CorsConfig, MetricsConfig};

pub fn fixture_payload() -> Value {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../docs/fixtures/floorplan.json");
    let text = std::fs::read_to_string(&path).expect("read fixture payload");
    serde_json::from_str(&text).expect("fixture payload is JSON")
}

/// Fixture rooms and sensors merged with extra request fields.
pub fn body_with(fields: Value) -> Value {
    let mut body = fixture_payload();
    let object = body.as_object_mut().expect("payload is an object");
    for (key, value) in fields.as_object().expect("fields are an object") {
        object.insert(key.clone(), value.clone());
    }
    body
}

pub fn app() -> Router {
    app_with_state(AppState::uncached())
}

pub fn app_with_state(state: AppState) -> Router {
    router(state, &MetricsConfig::default(), &CorsConfig::default())
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

pub async fn send(app: Router, request: Request<Body>) -> TestResponse {
    let response = app.oneshot(request).await.expect("router is infallible");
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };
    TestResponse {
        status,
        headers,
        body,
    }
}

pub async fn post_json(app: Router, uri: &str, body: &Value) -> TestResponse {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("valid request");
    send(app, request).await
}

pub async fn get(app: Router, uri: &str) -> TestResponse {
    let request = Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("valid request");
    send(app, request).await
}

pub fn step_ids(steps: &Value) -> Vec<String> {
    steps
        .as_array()
        .expect("steps array")
        .iter()
        .map(|step| step["id"].as_str().expect("step id").to_string())
        .collect()
}
