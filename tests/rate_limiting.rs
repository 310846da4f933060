//! Rate limiting over HTTP, in-process and against a live listener.

use std::time::Duration;

use axum::http::StatusCode;
use event_gate::auth::Role;
use event_gate::config::{Environment, RoutePolicy};
use event_gate::lifecycle::Shutdown;
use event_gate::HttpServer;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::sync::mpsc;

mod common;
use common::*;

const SCORE: &str = r#"{"team_id":"team-7","criterion":"innovation","score":87.5}"#;

#[tokio::test]
async fn score_submission_is_limited_per_client() {
    let (server, _clock) = server_with_clock(test_config());
    let router = server.router();
    let judge = token_for(Role::Judge);

    for expected_remaining in (0..20).rev() {
        let response = send(&router, score_request(&judge, "ip1", SCORE)).await;
        assert_eq!(response.status(), StatusCode::ACCEPTED);
        assert_eq!(
            response.headers()["x-ratelimit-remaining"],
            expected_remaining.to_string().as_str()
        );
    }

    let response = send(&router, score_request(&judge, "ip1", SCORE)).await;
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(response.headers()["x-ratelimit-remaining"], "0");
    assert_eq!(response.headers()["retry-after"], "60");
    assert_eq!(json_body(response).await["error"], "Too many requests");

    // A different client has its own window.
    let response = send(&router, score_request(&judge, "ip2", SCORE)).await;
    assert_eq!(response.status(), StatusCode::ACCEPTED);
}

#[tokio::test]
async fn window_expiry_readmits_client() {
    let mut config = test_config();
    config.rate_limit.routes = vec![RoutePolicy {
        path: "/api/submit-score".into(),
        limit: 2,
        window_ms: 1_000,
    }];
    let (server, clock) = server_with_clock(config);
    let router = server.router();
    let judge = token_for(Role::Judge);

    for _ in 0..2 {
        assert_eq!(send(&router, score_request(&judge, "ip1", SCORE)).await.status(), StatusCode::ACCEPTED);
    }
    assert_eq!(
        send(&router, score_request(&judge, "ip1", SCORE)).await.status(),
        StatusCode::TOO_MANY_REQUESTS
    );

    clock.advance(Duration::from_millis(1_000));
    let response = send(&router, score_request(&judge, "ip1", SCORE)).await;
    assert_eq!(response.status(), StatusCode::ACCEPTED);
    assert_eq!(response.headers()["x-ratelimit-remaining"], "1");
}

#[tokio::test]
async fn rate_check_runs_before_authentication() {
    let mut config = test_config();
    config.rate_limit.routes[0].limit = 1;
    let (server, _clock) = server_with_clock(config);
    let router = server.router();

    let response = send(&router, score_request("not-a-token", "ip9", SCORE)).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = send(&router, score_request(&token_for(Role::Judge), "ip9", SCORE)).await;
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn development_mode_never_limits() {
    let mut config = test_config();
    config.environment = Environment::Development;
    config.rate_limit.routes[0].limit = 1;
    let router = HttpServer::new(config).router();
    let judge = token_for(Role::Judge);

    for _ in 0..30 {
        let response = send(&router, score_request(&judge, "ip1", SCORE)).await;
        assert_eq!(response.status(), StatusCode::ACCEPTED);
    }
}

#[tokio::test]
async fn participant_cannot_submit_scores() {
    let (server, _clock) = server_with_clock(test_config());
    let response = send(
        &server.router(),
        score_request(&token_for(Role::Participant), "ip1", SCORE),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn invalid_score_is_bad_request() {
    let (server, _clock) = server_with_clock(test_config());
    let router = server.router();
    let judge = token_for(Role::Expert);

    for body in [
        r#"{"team_id":"t","criterion":"c","score":101}"#,
        r#"{"team_id":"","criterion":"c","score":5}"#,
        r#"{"team_id":"t","criterion":"  ","score":5}"#,
        r#"{"team_id":"t"}"#,
        "not json",
    ] {
        let response = send(&router, score_request(&judge, "ip1", body)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{body}");
        assert!(json_body(response).await["error"].is_string());
    }
}

#[tokio::test]
async fn accepted_score_echoes_submission() {
    let (server, _clock) = server_with_clock(test_config());
    let response = send(&server.router(), score_request(&token_for(Role::Master), "ip1", SCORE)).await;

    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let body = json_body(response).await;
    assert_eq!(body["team_id"], "team-7");
    assert_eq!(body["score"], 87.5);
    assert_eq!(body["judge"], "master-1");
    assert_eq!(body["judge_role"], "master");
    assert!(body["submission_id"].is_string());
}

#[tokio::test]
async fn live_server_applies_reloaded_policies() {
    let server = HttpServer::new(test_config());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let (updates_tx, updates_rx) = mpsc::unbounded_channel();
    let server_shutdown = shutdown.subscribe();
    let handle = tokio::spawn(async move { server.run(listener, updates_rx, server_shutdown).await });

    let mut reloaded = test_config();
    reloaded.rate_limit.routes = vec![RoutePolicy {
        path: "/api/auth/me".into(),
        limit: 1,
        window_ms: 60_000,
    }];
    updates_tx.send(reloaded).unwrap();
    tokio::time::sleep(Duration::from_millis(200)).await;

    let client = reqwest::Client::builder().no_proxy().build().unwrap();
    let url = format!("http://{addr}/api/auth/me");
    let token = token_for(Role::Supervisor);

    let first = client.get(&url).bearer_auth(&token).send().await.unwrap();
    assert_eq!(first.status(), 200);
    assert_eq!(first.headers()["x-ratelimit-remaining"], "0");

    let second = client.get(&url).bearer_auth(&token).send().await.unwrap();
    assert_eq!(second.status(), 429);

    shutdown.trigger();
    let result = tokio::time::timeout(Duration::from_secs(5), handle).await;
    assert!(matches!(result, Ok(Ok(Ok(())))));

    // The reload task ends with the server and drops its receiver.
    assert!(updates_tx.is_closed());
    assert!(updates_tx.send(test_config()).is_err());
}

#[tokio::test]
async fn stalled_request_body_times_out_with_408() {
    let mut config = test_config();
    config.timeouts.request_secs = 1;
    let server = HttpServer::new(config);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let (_updates_tx, updates_rx) = mpsc::unbounded_channel();
    let server_shutdown = shutdown.subscribe();
    let handle = tokio::spawn(async move { server.run(listener, updates_rx, server_shutdown).await });

    // Announce a body that never arrives.
    let mut stream = tokio::net::TcpStream::connect(addr).await.unwrap();
    let head = format!(
        "POST /api/submit-score HTTP/1.1\r\n\
         Host: {addr}\r\n\
         Authorization: Bearer {}\r\n\
         Content-Type: application/json\r\n\
         Content-Length: 64\r\n\r\n",
        token_for(Role::Judge)
    );
    stream.write_all(head.as_bytes()).await.unwrap();

    let mut buf = vec![0u8; 1024];
    let n = tokio::time::timeout(Duration::from_secs(5), stream.read(&mut buf))
        .await
        .unwrap()
        .unwrap();
    let response = String::from_utf8_lossy(&buf[..n]);
    assert!(response.starts_with("HTTP/1.1 408"), "{response}");
    drop(stream);

    shutdown.trigger();
    let result = tokio::time::timeout(Duration::from_secs(5), handle).await;
    assert!(matches!(result, Ok(Ok(Ok(())))));
}
