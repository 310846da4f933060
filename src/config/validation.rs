//! Configuration validation.
//!
//! Serde handles syntax; this module checks values. All errors are
//! collected so one reload reports every problem at once.

use std::collections::HashSet;
use std::net::SocketAddr;

use crate::config::schema::GateConfig;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("invalid bind address: {0}")]
    BindAddress(String),

    #[error("invalid metrics address: {0}")]
    MetricsAddress(String),

    #[error("rate limit route path must start with '/': {0:?}")]
    RoutePath(String),

    #[error("duplicate rate limit route: {0}")]
    DuplicateRoute(String),

    #[error("rate limit for {0} must be greater than zero")]
    ZeroLimit(String),

    #[error("rate window for {0} must be greater than zero")]
    ZeroWindow(String),

    #[error("request timeout must be greater than zero")]
    ZeroTimeout,

    #[error("cookie name must not be empty")]
    EmptyCookieName,
}

pub fn validate_config(config: &GateConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(config.listener.bind_address.clone()));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::MetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroTimeout);
    }

    if config.auth.cookie_name.trim().is_empty() {
        errors.push(ValidationError::EmptyCookieName);
    }

    let mut seen = HashSet::new();
    for policy in &config.rate_limit.routes {
        if !policy.path.starts_with('/') {
            errors.push(ValidationError::RoutePath(policy.path.clone()));
        }
        if !seen.insert(policy.path.as_str()) {
            errors.push(ValidationError::DuplicateRoute(policy.path.clone()));
        }
        if policy.limit == 0 {
            errors.push(ValidationError::ZeroLimit(policy.path.clone()));
        }
        if policy.window_ms == 0 {
            errors.push(ValidationError::ZeroWindow(policy.path.clone()));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
