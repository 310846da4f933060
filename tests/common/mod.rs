//! Shared utilities for integration tests.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, Response},
    Router,
};
use event_gate::auth::{Principal, Role, TokenAuthenticator};
use event_gate::config::{Environment, GateConfig};
use event_gate::security::{ManualClock, RateGovernor};
use event_gate::HttpServer;
use serde_json::Value;
use tower::ServiceExt;

pub const SECRET: &str = "integration-test-secret";

/// Production-mode config with a literal secret.
pub fn test_config() -> GateConfig {
    let mut config = GateConfig::default();
    config.environment = Environment::Production;
    config.auth.secret = Some(SECRET.to_string());
    config.listener.bind_address = "127.0.0.1:0".to_string();
    config
}

/// Server whose governor runs on a manual clock.
#[allow(dead_code)]
pub fn server_with_clock(config: GateConfig) -> (HttpServer, ManualClock) {
    let clock = ManualClock::new();
    let authenticator = Arc::new(TokenAuthenticator::new(config.auth.secret.as_deref()));
    let governor = Arc::new(RateGovernor::with_clock(
        config.rate_limit_enforced(),
        Arc::new(clock.clone()),
    ));
    (HttpServer::with_components(config, authenticator, governor), clock)
}

pub fn token_for(role: Role) -> String {
    let principal = Principal::new(
        format!("{role}-1"),
        format!("{role}@example.org"),
        format!("Test {role}"),
        role,
    );
    TokenAuthenticator::new(Some(SECRET))
        .issue(&principal, Duration::from_secs(3600))
        .unwrap()
}

#[allow(dead_code)]
pub fn get(path: &str) -> axum::http::request::Builder {
    Request::builder().method("GET").uri(path)
}

#[allow(dead_code)]
pub fn score_request(token: &str, client: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/submit-score")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .header(header::CONTENT_TYPE, "application/json")
        .header("x-forwarded-for", client)
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub async fn send(router: &Router, request: Request<Body>) -> Response<Body> {
    router.clone().oneshot(request).await.unwrap()
}

pub async fn json_body(response: Response<Body>) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
