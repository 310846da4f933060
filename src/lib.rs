//! Event Gate Library
//!
//! Request gating for the hackathon platform: bearer-token authentication,
//! role checks and a fixed-window request rate governor, wired into an Axum
//! HTTP surface.

pub mod auth;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod security;

pub use auth::{AuthError, Principal, Role, TokenAuthenticator};
pub use config::schema::GateConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use security::rate_limit::{RateDecision, RateGovernor};
