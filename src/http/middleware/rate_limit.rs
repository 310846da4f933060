//! Per-route fixed-window rate limiting.
//!
//! Runs as a route layer so it sees the matched path and executes before
//! authentication extractors.

use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, MatchedPath, Request, State},
    http::HeaderValue,
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::http::error::ApiError;
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::security::client_identifier;

pub const X_RATELIMIT_LIMIT: &str = "x-ratelimit-limit";
pub const X_RATELIMIT_REMAINING: &str = "x-ratelimit-remaining";

pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| request.uri().path().to_string());

    let policy = state.policies.load().iter().find(|p| p.path == route).cloned();
    let Some(policy) = policy else {
        return next.run(request).await;
    };

    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let client = client_identifier(request.headers(), peer);

    let decision = state
        .governor
        .check_and_admit(&client, &route, policy.limit, policy.window());

    if !decision.admitted {
        tracing::warn!(client = %client, route = %route, limit = policy.limit, "Rate limit exceeded");
        metrics::record_rate_limited(&route);
        return ApiError::TooManyRequests {
            limit: policy.limit,
            retry_after: decision.reset_after,
        }
        .into_response();
    }

    let mut response = next.run(request).await;
    let headers = response.headers_mut();
    headers.insert(X_RATELIMIT_LIMIT, HeaderValue::from(policy.limit));
    headers.insert(X_RATELIMIT_REMAINING, HeaderValue::from(decision.remaining));
    response
}
