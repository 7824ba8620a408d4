//! Startup orchestration.
//!
//! # Responsibilities
//! - Build the rotator and register configured log paths
//! - Spawn the supervised process
//! - Serve the admin surface until the process exits
//! - Classify the exit against the last requested signal
//!
//! # Design Decisions
//! - Fail fast: a log path that cannot be rotated aborts startup
//! - The process exiting closes the admin server
//! - Rotation is stopped on every exit path

use std::io;
use std::sync::Arc;

use thiserror::Error;

use crate::admin::{AdminError, AdminServer};
use crate::config::{ReopenSignal, SidecarConfig};
use crate::lifecycle::shutdown::Shutdown;
use crate::lifecycle::signals::forward_termination;
use crate::process::{classify_exit, ExitOutcome, ManagedProcess, ProcessSupervisor, SupervisorError};
use crate::rotation::{LogRotator, ReopenHook, RotationError, RotationSettings};

/// Errors that end a sidecar run before the process exits normally.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("log rotation: {0}")]
    Rotation(#[from] RotationError),

    #[error("process: {0}")]
    Process(#[from] SupervisorError),

    #[error("admin server: {0}")]
    Admin(#[from] AdminError),

    #[error("waiting for process: {0}")]
    Wait(#[source] io::Error),

    #[error("process watcher failed: {0}")]
    Watcher(String),
}

/// Stops the rotator when dropped.
struct RotationGuard(LogRotator);

impl Drop for RotationGuard {
    fn drop(&mut self) {
        self.0.stop_all();
    }
}

/// Build the reopen hook for `signal`.
pub fn reopen_hook(signal: ReopenSignal, process: Arc<ManagedProcess>) -> ReopenHook {
    match signal {
        ReopenSignal::Usr1 => Arc::new(move || process.reopen_logs().map_err(Into::into)),
        ReopenSignal::None => Arc::new(|| Ok(())),
    }
}

/// The assembled sidecar.
pub struct Sidecar {
    config: SidecarConfig,
}

impl Sidecar {
    pub fn new(config: SidecarConfig) -> Self {
        Self { config }
    }

    /// Run until the supervised process exits.
    pub async fn run(self) -> Result<ExitOutcome, StartupError> {
        let config = self.config;
        let process = Arc::new(ManagedProcess::from_config(&config.process));

        let rotator = LogRotator::new(
            RotationSettings::from(&config.rotation),
            reopen_hook(config.process.reopen_signal, Arc::clone(&process)),
        );
        let _rotation = RotationGuard(rotator.clone());

        for path in &config.process.log_paths {
            rotator.register_and_start(path)?;
        }

        let child = process.start()?;
        let supervisor: Arc<dyn ProcessSupervisor> = process.clone();
        let admin = Arc::new(AdminServer::from_config(&config.admin, Arc::clone(&supervisor)));

        let shutdown = Shutdown::new();
        tokio::spawn(forward_termination(Arc::clone(&supervisor), shutdown.subscribe()));

        let watcher = {
            let process = Arc::clone(&process);
            let admin = Arc::clone(&admin);
            tokio::spawn(async move {
                let status = process.wait(child).await;
                let _ = admin.close();
                status
            })
        };

        // The process exiting may close the server before it starts; that
        // is not an admin failure.
        let admin_failure = match admin.start().await {
            Err(e) if !process.completed() => {
                tracing::error!(error = %e, "Admin server failed, killing process");
                let _ = process.kill();
                Some(e)
            }
            _ => None,
        };

        let status = watcher
            .await
            .map_err(|e| StartupError::Watcher(e.to_string()))?
            .map_err(StartupError::Wait);
        shutdown.trigger();

        if let Some(e) = admin_failure {
            return Err(StartupError::Admin(e));
        }

        Ok(classify_exit(status?, admin.last_requested_signal()))
    }
}
