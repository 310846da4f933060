//! HTTP surface.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum router, tower-http layers, request ID)
//!     → middleware/rate_limit.rs (rate-sensitive routes only)
//!     → extract.rs (credential → Principal → role check)
//!     → handlers.rs (business logic)
//!     → error.rs (JSON error bodies)
//! ```

pub mod error;
pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod request;
pub mod server;

pub use error::ApiError;
pub use extract::{AdminOnly, AdminOrSupervisor, AuthUser, RequireRole, RoleSet, ScoreSubmitters};
pub use request::{MakeRequestUuidV4, X_REQUEST_ID};
pub use server::{AppState, HttpServer};
