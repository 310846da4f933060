//! API error responses.

use std::time::Duration;

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};

use crate::auth::AuthError;
use crate::http::middleware::rate_limit::{X_RATELIMIT_LIMIT, X_RATELIMIT_REMAINING};

/// Errors surfaced to API clients as `{"error": "..."}`.
///
/// Credential and role failures share one variant so the body never says
/// which check failed.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Unauthorized")]
    Unauthorized,

    #[error("Too many requests")]
    TooManyRequests { limit: u32, retry_after: Duration },

    #[error("{0}")]
    BadRequest(String),

    #[error("Internal server error")]
    Internal,
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Unauthenticated | AuthError::InvalidToken => ApiError::Unauthorized,
            AuthError::ServerMisconfigured | AuthError::Signing(_) => ApiError::Internal,
        }
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::TooManyRequests { .. } => StatusCode::TOO_MANY_REQUESTS,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(serde_json::json!({ "error": self.to_string() }));
        let mut response = (self.status(), body).into_response();

        if let ApiError::TooManyRequests { limit, retry_after } = self {
            let retry_secs = (retry_after.as_millis() as u64).div_ceil(1000).max(1);
            let headers = response.headers_mut();
            headers.insert(X_RATELIMIT_LIMIT, HeaderValue::from(limit));
            headers.insert(X_RATELIMIT_REMAINING, HeaderValue::from(0u32));
            headers.insert(header::RETRY_AFTER, HeaderValue::from(retry_secs));
        }

        response
    }
}
