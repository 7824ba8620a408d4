//! Process supervision subsystem.
//!
//! # Data Flow
//! ```text
//! ManagedProcess::start (managed.rs)
//!     → child running, pid recorded
//!     → admin server calls kill / quit / hangup (supervisor.rs trait)
//!     → rotation reopen hook calls reopen_logs
//!     → ManagedProcess::wait reaps the child
//!     → classify_exit (exit.rs) checks it against the last requested signal
//! ```

pub mod exit;
pub mod managed;
pub mod supervisor;

pub use exit::{classify_exit, ExitOutcome};
pub use managed::{ManagedProcess, ProcessSignal};
pub use supervisor::{ProcessSupervisor, SupervisorError};
