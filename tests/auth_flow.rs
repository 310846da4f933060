//! Authentication and role checks over HTTP.

use axum::{
    body::Body,
    http::{header, StatusCode},
};
use event_gate::auth::{Principal, Role, TokenAuthenticator};
use event_gate::HttpServer;

mod common;
use common::*;

#[tokio::test]
async fn missing_credential_is_unauthorized() {
    let router = HttpServer::new(test_config()).router();
    let response = send(&router, get("/api/auth/me").body(Body::empty()).unwrap()).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(response).await["error"], "Unauthorized");
}

#[tokio::test]
async fn bearer_header_resolves_principal() {
    let router = HttpServer::new(test_config()).router();
    let request = get("/api/auth/me")
        .header(header::AUTHORIZATION, format!("Bearer {}", token_for(Role::Judge)))
        .body(Body::empty())
        .unwrap();

    let response = send(&router, request).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["subject"], "judge-1");
    assert_eq!(body["role"], "judge");
}

#[tokio::test]
async fn cookie_credential_is_accepted() {
    let router = HttpServer::new(test_config()).router();
    let request = get("/api/auth/me")
        .header(header::COOKIE, format!("theme=dark; token={}", token_for(Role::Participant)))
        .body(Body::empty())
        .unwrap();

    let response = send(&router, request).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["role"], "participant");
}

#[tokio::test]
async fn expired_token_is_unauthorized() {
    let principal = Principal::new("u1", "u1@example.org", "U1", Role::Admin);
    let expired = TokenAuthenticator::new(Some(SECRET))
        .issue_with_expiry(&principal, 1)
        .unwrap();

    let router = HttpServer::new(test_config()).router();
    let request = get("/api/admin/status")
        .header(header::AUTHORIZATION, format!("Bearer {expired}"))
        .body(Body::empty())
        .unwrap();

    assert_eq!(send(&router, request).await.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn participant_is_denied_admin_route_with_generic_message() {
    let router = HttpServer::new(test_config()).router();
    let request = get("/api/admin/status")
        .header(header::AUTHORIZATION, format!("Bearer {}", token_for(Role::Participant)))
        .body(Body::empty())
        .unwrap();

    let response = send(&router, request).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(response).await["error"], "Unauthorized");
}

#[tokio::test]
async fn supervisor_route_admits_admin_and_supervisor_only() {
    let router = HttpServer::new(test_config()).router();

    for (role, expected) in [
        (Role::Admin, StatusCode::OK),
        (Role::Supervisor, StatusCode::OK),
        (Role::Judge, StatusCode::UNAUTHORIZED),
        (Role::Participant, StatusCode::UNAUTHORIZED),
    ] {
        let request = get("/api/supervisor/overview")
            .header(header::AUTHORIZATION, format!("Bearer {}", token_for(role)))
            .body(Body::empty())
            .unwrap();
        assert_eq!(send(&router, request).await.status(), expected, "role {role}");
    }
}

#[tokio::test]
async fn admin_status_reports_gate_state() {
    let router = HttpServer::new(test_config()).router();
    let request = get("/api/admin/status")
        .header(header::AUTHORIZATION, format!("Bearer {}", token_for(Role::Admin)))
        .body(Body::empty())
        .unwrap();

    let response = send(&router, request).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["environment"], "production");
    assert_eq!(body["auth_configured"], true);
    assert_eq!(body["rate_limit_enforced"], true);
}

#[tokio::test]
async fn missing_secret_is_server_error() {
    let mut config = test_config();
    config.auth.secret = None;
    config.auth.secret_env = "EVENT_GATE_TEST_NO_SUCH_SECRET".to_string();

    let router = HttpServer::new(config).router();
    let request = get("/api/auth/me")
        .header(header::AUTHORIZATION, format!("Bearer {}", token_for(Role::Admin)))
        .body(Body::empty())
        .unwrap();

    let response = send(&router, request).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json_body(response).await["error"], "Internal server error");
}

#[tokio::test]
async fn responses_carry_request_id_and_security_headers() {
    let router = HttpServer::new(test_config()).router();
    let response = send(&router, get("/health").body(Body::empty()).unwrap()).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));
    assert_eq!(response.headers()[header::X_CONTENT_TYPE_OPTIONS], "nosniff");

    let request = get("/health")
        .header("x-request-id", "abc-123")
        .body(Body::empty())
        .unwrap();
    let response = send(&router, request).await;
    assert_eq!(response.headers()["x-request-id"], "abc-123");
}
