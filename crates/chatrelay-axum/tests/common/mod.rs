//! Shared helpers for router tests.

#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use chatrelay_axum::bootstrap::{AppContext, CorsConfig};
use chatrelay_axum::routes::create_router;
use chatrelay_core::{ConfigStore, InMemoryConfigRepository, ServerConfig};
use http_body_util::BodyExt;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;

/// Context around an in-memory config; nothing touches disk.
pub fn test_context(config: ServerConfig) -> AppContext {
    let repo = Arc::new(InMemoryConfigRepository::new(config.clone()));
    let store = Arc::new(ConfigStore::new(repo, config));
    AppContext::new(store, 0, CancellationToken::new())
}

/// Context plus a router sharing its scheduler and worker hub.
pub fn test_app(config: ServerConfig) -> (AppContext, Router) {
    let ctx = test_context(config);
    let app = create_router(ctx.clone(), &CorsConfig::AllowAll);
    (ctx, app)
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn post_raw(uri: &str, body: &'static str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body))
        .unwrap()
}

/// Send a request and decode the JSON body.
pub async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

pub fn chat_body(content: &str) -> Value {
    serde_json::json!({
        "model": "test-model",
        "messages": [{"role": "user", "content": content}],
        "maxTokens": 32
    })
}
