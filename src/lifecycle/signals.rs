//! OS signal handling.
//!
//! # Responsibilities
//! - Listen for SIGTERM / SIGINT aimed at the sidecar
//! - Forward them to the supervised process
//!
//! # Design Decisions
//! - Uses Tokio's signal handling (async-safe)
//! - First signal asks the process to quit gracefully
//! - A repeated signal kills it

use std::sync::Arc;

use crate::lifecycle::shutdown::ShutdownSignal;
use crate::process::ProcessSupervisor;

/// Forward termination signals to `supervisor` until `shutdown` fires.
pub async fn forward_termination(supervisor: Arc<dyn ProcessSupervisor>, shutdown: ShutdownSignal) {
    forward_until_shutdown(supervisor, Termination::install(), shutdown).await
}

/// Forward every event from `events` to `supervisor`: quit on the first, kill
/// on any after it. The source is created once by the caller, so an event
/// delivered while a previous one is being forwarded is still observed.
pub(crate) async fn forward_until_shutdown<S: TerminationSource>(
    supervisor: Arc<dyn ProcessSupervisor>,
    mut events: S,
    mut shutdown: ShutdownSignal,
) {
    let mut received = 0usize;

    loop {
        tokio::select! {
            _ = events.next() => {
                received += 1;
                let result = if received == 1 {
                    tracing::info!("Termination signal received, asking process to quit");
                    supervisor.quit()
                } else {
                    tracing::warn!("Repeated termination signal, killing process");
                    supervisor.kill()
                };
                if let Err(e) = result {
                    tracing::error!(error = %e, "Failed to forward termination signal");
                }
            }
            _ = shutdown.recv() => break,
        }
    }
}

/// A stream of termination requests.
pub(crate) trait TerminationSource {
    /// Resolve when the next termination request arrives.
    async fn next(&mut self);
}

/// SIGTERM and Ctrl-C listeners, installed once.
struct Termination {
    #[cfg(unix)]
    sigterm: Option<tokio::signal::unix::Signal>,
}

impl Termination {
    #[cfg(unix)]
    fn install() -> Self {
        use tokio::signal::unix::{signal, SignalKind};

        let sigterm = match signal(SignalKind::terminate()) {
            Ok(sigterm) => Some(sigterm),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to install SIGTERM handler");
                None
            }
        };
        Self { sigterm }
    }

    #[cfg(not(unix))]
    fn install() -> Self {
        Self {}
    }
}

impl TerminationSource for Termination {
    #[cfg(unix)]
    async fn next(&mut self) {
        let Some(sigterm) = self.sigterm.as_mut() else {
            return ctrl_c().await;
        };

        let closed = tokio::select! {
            received = sigterm.recv() => received.is_none(),
            _ = ctrl_c() => false,
        };
        if closed {
            self.sigterm = None;
            ctrl_c().await;
        }
    }

    #[cfg(not(unix))]
    async fn next(&mut self) {
        ctrl_c().await
    }
}

/// Resolve on Ctrl-C, or never if the handler cannot be installed.
async fn ctrl_c() {
    if tokio::signal::ctrl_c().await.is_err() {
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::Shutdown;
    use crate::process::SupervisorError;
    use std::sync::Mutex;
    use std::time::Duration;
    use tokio::sync::mpsc;

    #[derive(Default)]
    struct Recording {
        calls: Mutex<Vec<&'static str>>,
    }

    impl ProcessSupervisor for Recording {
        fn kill(&self) -> Result<(), SupervisorError> {
            self.calls.lock().unwrap().push("kill");
            Ok(())
        }
        fn quit(&self) -> Result<(), SupervisorError> {
            self.calls.lock().unwrap().push("quit");
            Ok(())
        }
        fn hangup(&self) -> Result<(), SupervisorError> {
            self.calls.lock().unwrap().push("hangup");
            Ok(())
        }
    }

    struct Channel(mpsc::UnboundedReceiver<()>);

    impl TerminationSource for Channel {
        async fn next(&mut self) {
            if self.0.recv().await.is_none() {
                std::future::pending::<()>().await;
            }
        }
    }

    #[tokio::test]
    async fn exits_on_shutdown() {
        let shutdown = Shutdown::new();
        let task = tokio::spawn(forward_termination(
            Arc::new(Recording::default()),
            shutdown.subscribe(),
        ));

        shutdown.trigger();
        tokio::time::timeout(Duration::from_secs(1), task)
            .await
            .expect("forwarder did not exit")
            .unwrap();
    }

    #[tokio::test]
    async fn back_to_back_signals_quit_then_kill() {
        let supervisor = Arc::new(Recording::default());
        let shutdown = Shutdown::new();
        let (tx, rx) = mpsc::unbounded_channel();

        // Both arrive before the first one is handled.
        tx.send(()).unwrap();
        tx.send(()).unwrap();

        let task = tokio::spawn(forward_until_shutdown(
            supervisor.clone(),
            Channel(rx),
            shutdown.subscribe(),
        ));

        for _ in 0..100 {
            if supervisor.calls.lock().unwrap().len() == 2 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert_eq!(*supervisor.calls.lock().unwrap(), vec!["quit", "kill"]);

        shutdown.trigger();
        tokio::time::timeout(Duration::from_secs(1), task)
            .await
            .expect("forwarder did not exit")
            .unwrap();
    }
}
