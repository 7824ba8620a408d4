//! Capability interface for controlling the supervised process.

use std::io;
use thiserror::Error;

/// Errors that can occur while controlling the supervised process.
#[derive(Debug, Error)]
pub enum SupervisorError {
    /// The process is not running (not started yet, or already exited).
    #[error("no running process")]
    NotRunning,

    /// Signal delivery failed.
    #[error("failed to send {signal} to pid {pid}: {source}")]
    Signal {
        signal: &'static str,
        pid: u32,
        #[source]
        source: io::Error,
    },

    /// The process could not be spawned.
    #[error("failed to spawn {command}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },

    /// The operation is not available on this supervisor or platform.
    #[error("{0} is not supported")]
    Unsupported(&'static str),

    /// Any other failure, reported verbatim.
    #[error("{0}")]
    Other(String),
}

/// Lifecycle operations the admin server can trigger on the process.
pub trait ProcessSupervisor: Send + Sync {
    /// Terminate the process immediately.
    fn kill(&self) -> Result<(), SupervisorError>;

    /// Ask the process to shut down gracefully.
    fn quit(&self) -> Result<(), SupervisorError>;

    /// Ask the process to reload its configuration.
    fn hangup(&self) -> Result<(), SupervisorError>;

    /// Ask the process to reopen its log files.
    fn reopen_logs(&self) -> Result<(), SupervisorError> {
        Err(SupervisorError::Unsupported("reopening logs"))
    }
}
