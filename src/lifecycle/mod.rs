//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Register log paths → Spawn process → Serve admin surface
//!
//! Shutdown (shutdown.rs):
//!     Process exits → Close admin server → Stop rotation → Exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → quit the process (kill on repeat)
//! ```
//!
//! # Design Decisions
//! - Ordered startup: rotation first, then process, then listener
//! - The supervised process owns the sidecar's lifetime

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::{Shutdown, ShutdownSignal};
pub use startup::{Sidecar, StartupError};
