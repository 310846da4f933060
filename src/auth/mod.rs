//! Authentication subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → credential.rs (cookie, then Authorization: Bearer)
//!     → token.rs (verify HS256 signature + expiry, decode claims)
//!     → principal.rs (Principal with Role)
//!     → caller checks role membership
//! ```
//!
//! # Design Decisions
//! - Stateless: no session store, no revocation list
//! - Fail closed: a missing signing secret rejects every credential
//! - Role checks belong to the caller, not the authenticator

pub mod credential;
pub mod principal;
pub mod token;

pub use credential::extract_credential;
pub use principal::{Principal, Role};
pub use token::{AuthError, TokenAuthenticator};
