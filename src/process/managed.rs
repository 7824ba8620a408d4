//! Child process supervision.
//!
//! # Responsibilities
//! - Spawn the configured command
//! - Deliver lifecycle signals to it (SIGKILL, SIGQUIT, SIGHUP, SIGUSR1)
//! - Track whether it has exited
//!
//! # Design Decisions
//! - The pid is cleared once the child is reaped, so late signals fail
//!   with `NotRunning` instead of hitting a recycled pid
//! - Signal delivery uses `nix` on Unix; other platforms report unsupported

use std::io;
use std::process::{ExitStatus, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use tokio::process::{Child, Command};

use crate::config::ProcessConfig;
use crate::process::supervisor::{ProcessSupervisor, SupervisorError};

/// Signals the sidecar sends to the supervised process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessSignal {
    Kill,
    Quit,
    Hangup,
    Usr1,
}

impl ProcessSignal {
    pub fn name(self) -> &'static str {
        match self {
            ProcessSignal::Kill => "SIGKILL",
            ProcessSignal::Quit => "SIGQUIT",
            ProcessSignal::Hangup => "SIGHUP",
            ProcessSignal::Usr1 => "SIGUSR1",
        }
    }

    #[cfg(unix)]
    fn as_nix(self) -> nix::sys::signal::Signal {
        use nix::sys::signal::Signal;
        match self {
            ProcessSignal::Kill => Signal::SIGKILL,
            ProcessSignal::Quit => Signal::SIGQUIT,
            ProcessSignal::Hangup => Signal::SIGHUP,
            ProcessSignal::Usr1 => Signal::SIGUSR1,
        }
    }
}

/// A supervised child process.
pub struct ManagedProcess {
    command: String,
    args: Vec<String>,
    pid: Mutex<Option<u32>>,
    completed: AtomicBool,
}

impl ManagedProcess {
    pub fn new(command: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            command: command.into(),
            args,
            pid: Mutex::new(None),
            completed: AtomicBool::new(false),
        }
    }

    pub fn from_config(config: &ProcessConfig) -> Self {
        Self::new(config.command.clone(), config.args.clone())
    }

    /// Spawn the process. The returned child must be passed to [`wait`].
    ///
    /// [`wait`]: ManagedProcess::wait
    pub fn start(&self) -> Result<Child, SupervisorError> {
        let child = Command::new(&self.command)
            .args(&self.args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| SupervisorError::Spawn {
                command: self.command.clone(),
                source,
            })?;

        let pid = child.id();
        *self.pid.lock().unwrap_or_else(PoisonError::into_inner) = pid;
        tracing::info!(command = %self.command, args = ?self.args, pid = ?pid, "Process started");

        Ok(child)
    }

    /// Wait for the child to exit and mark the process completed.
    pub async fn wait(&self, mut child: Child) -> io::Result<ExitStatus> {
        let status = child.wait().await;

        *self.pid.lock().unwrap_or_else(PoisonError::into_inner) = None;
        self.completed.store(true, Ordering::Release);

        match &status {
            Ok(status) => tracing::info!(command = %self.command, %status, "Process exited"),
            Err(e) => tracing::error!(command = %self.command, error = %e, "Failed to wait for process"),
        }
        status
    }

    /// Whether the process has exited.
    pub fn completed(&self) -> bool {
        self.completed.load(Ordering::Acquire)
    }

    /// Pid of the running process, if any.
    pub fn pid(&self) -> Option<u32> {
        *self.pid.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Send `signal` to the running process.
    pub fn signal(&self, signal: ProcessSignal) -> Result<(), SupervisorError> {
        let pid = self.pid().ok_or(SupervisorError::NotRunning)?;
        tracing::info!(pid, signal = signal.name(), "Signalling process");
        deliver(pid, signal)
    }
}

#[cfg(unix)]
fn deliver(pid: u32, signal: ProcessSignal) -> Result<(), SupervisorError> {
    use nix::sys::signal;
    use nix::unistd::Pid;

    let raw = i32::try_from(pid).map_err(|_| SupervisorError::Signal {
        signal: signal.name(),
        pid,
        source: io::Error::new(io::ErrorKind::InvalidInput, "pid out of range"),
    })?;

    signal::kill(Pid::from_raw(raw), signal.as_nix()).map_err(|errno| SupervisorError::Signal {
        signal: signal.name(),
        pid,
        source: io::Error::from(errno),
    })
}

#[cfg(not(unix))]
fn deliver(_pid: u32, _signal: ProcessSignal) -> Result<(), SupervisorError> {
    Err(SupervisorError::Unsupported("signal delivery"))
}

impl ProcessSupervisor for ManagedProcess {
    fn kill(&self) -> Result<(), SupervisorError> {
        self.signal(ProcessSignal::Kill)
    }

    fn quit(&self) -> Result<(), SupervisorError> {
        self.signal(ProcessSignal::Quit)
    }

    fn hangup(&self) -> Result<(), SupervisorError> {
        self.signal(ProcessSignal::Hangup)
    }

    fn reopen_logs(&self) -> Result<(), SupervisorError> {
        self.signal(ProcessSignal::Usr1)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::os::unix::process::ExitStatusExt;

    #[test]
    fn signal_before_start_is_not_running() {
        let process = ManagedProcess::new("sleep", vec!["5".into()]);
        assert!(matches!(process.hangup(), Err(SupervisorError::NotRunning)));
        assert!(!process.completed());
    }

    #[tokio::test]
    async fn spawn_failure_is_reported() {
        let process = ManagedProcess::new("/nonexistent/binary", vec![]);
        let err = process.start().unwrap_err();
        assert!(matches!(err, SupervisorError::Spawn { .. }));
    }

    #[tokio::test]
    async fn kill_terminates_process() {
        let process = ManagedProcess::new("sleep", vec!["30".into()]);
        let child = process.start().unwrap();
        assert!(process.pid().is_some());

        process.kill().unwrap();
        let status = process.wait(child).await.unwrap();

        assert_eq!(status.signal(), Some(9));
        assert!(process.completed());
        assert!(process.pid().is_none());
        assert!(matches!(process.quit(), Err(SupervisorError::NotRunning)));
    }

    #[tokio::test]
    async fn clean_exit_is_completed() {
        let process = ManagedProcess::new("true", vec![]);
        let child = process.start().unwrap();
        let status = process.wait(child).await.unwrap();
        assert!(status.success());
        assert!(process.completed());
    }
}
