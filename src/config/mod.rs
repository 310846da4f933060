//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse, deserialize, EVENT_GATE_ENV override)
//!     → validation.rs (semantic checks)
//!     → GateConfig (validated, immutable)
//!
//! On file change:
//!     watcher.rs detects change
//!     → empty snapshots skipped, loader.rs parses and validates
//!     → published only if the rate limit policies changed
//!     → server swaps rate limit policies atomically
//! ```
//!
//! # Design Decisions
//! - All fields have defaults to allow minimal configs
//! - The signing secret is read once at startup and never reloaded

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, ConfigError};
pub use schema::{
    AuthConfig, Environment, GateConfig, ListenerConfig, LogFormat, ObservabilityConfig,
    RateLimitConfig, RoutePolicy,
};
