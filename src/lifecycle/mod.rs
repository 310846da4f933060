//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (main.rs):
//!     Load config → Init logging → Build server → Bind listener
//!
//! Shutdown (shutdown.rs):
//!     Ctrl+C or trigger() → stop accepting → drain in-flight → exit
//! ```

pub mod shutdown;

pub use shutdown::{wait_for_ctrl_c, Shutdown};
