//! Admin sidecar library: HTTP lifecycle control and scheduled log rotation
//! for a supervised server process.

pub mod admin;
pub mod config;
pub mod lifecycle;
pub mod observability;
pub mod process;
pub mod rotation;

pub use admin::{AdminServer, RequestedSignal};
pub use config::SidecarConfig;
pub use lifecycle::Sidecar;
pub use process::ProcessSupervisor;
pub use rotation::LogRotator;
