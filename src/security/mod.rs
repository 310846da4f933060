//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request on a rate-sensitive route:
//!     → client.rs (derive client identifier)
//!     → rate_limit.rs (fixed-window check per client + route)
//!     → 429 on rejection, otherwise continue to authentication
//! ```
//!
//! # Design Decisions
//! - Governor is constructed by the server and shared via Arc, never global
//! - Enforcement is an explicit constructor flag
//! - No cross-process coordination: counters are per instance

pub mod client;
pub mod rate_limit;

pub use client::client_identifier;
pub use rate_limit::{Clock, ManualClock, RateDecision, RateGovernor, SystemClock};
