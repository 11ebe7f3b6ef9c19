//! Shared helpers for HTTP integration tests.
//!
//! Requests are driven through the router with `tower::ServiceExt::oneshot`
//! against the in-memory store, so no server or Redis is needed.

#![allow(dead_code, reason = "each test binary uses a different subset")]

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use serde_json::Value;
use tower::ServiceExt;

use biosarthi_api::AppState;
use biosarthi_api::config::AppConfig;
use biosarthi_api::gateway::auth::generate_jwt;
use biosarthi_api::kv::{Fields, InMemoryKv};
use biosarthi_api::server::build_router;

pub const SECRET: &str = "integration-test-secret";
pub const OPERATOR: &str = "ops@biosarthi.com";

pub fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.auth.jwt_secret = Some(SECRET.to_string());
    config.admin.operator_emails = vec![OPERATOR.to_string()];
    config.health.required_env_keys = Vec::new();
    config
}

/// Router over a fresh in-memory store, plus a handle to that store.
pub fn test_app_with(config: AppConfig) -> (Router, InMemoryKv) {
    let kv = InMemoryKv::new();
    let state = AppState::new(config, Arc::new(kv.clone()));
    (build_router(state), kv)
}

pub fn test_app() -> (Router, InMemoryKv) {
    test_app_with(test_config())
}

pub fn token(user_id: &str, email: &str) -> String {
    generate_jwt(user_id, email, SECRET, 3600).unwrap()
}

pub fn fields(pairs: &[(&str, &str)]) -> Fields {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect()
}

#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

/// Send one request. An empty response body reads as `null`.
pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> TestResponse {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };

    TestResponse { status, body }
}

pub async fn get(app: &Router, uri: &str, token: Option<&str>) -> TestResponse {
    send(app, Method::GET, uri, token, None).await
}
