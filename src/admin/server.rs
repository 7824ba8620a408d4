//! Admin server lifecycle.
//!
//! # State Transitions
//! ```text
//! NotStarted → Listening: start() binds the address
//! Listening  → Closed:    close(), or the serve loop ending
//! NotStarted → Closed:    close() before start()
//! ```
//!
//! # Design Decisions
//! - The lifecycle mutex covers bind and teardown only; it is released
//!   before serving, so `close()` never waits on in-flight requests
//! - Closed is terminal: `start()` fails with `AlreadyClosed`
//! - `close()` is idempotent

use std::io;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::oneshot;

use crate::admin::handlers::AdminState;
use crate::admin::setup_admin_router;
use crate::admin::signal::RequestedSignal;
use crate::config::AdminConfig;
use crate::process::ProcessSupervisor;

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors returned by [`AdminServer::start`].
#[derive(Debug, Error)]
pub enum AdminError {
    /// The server was closed and cannot be started again.
    #[error("already closed")]
    AlreadyClosed,

    /// The server is already serving.
    #[error("already listening on {0}")]
    AlreadyListening(SocketAddr),

    /// The listen address could not be bound.
    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: io::Error,
    },

    /// The serve loop failed.
    #[error("admin server failed: {0}")]
    Serve(#[source] io::Error),
}

enum Lifecycle {
    NotStarted,
    Listening {
        local_addr: SocketAddr,
        shutdown: oneshot::Sender<()>,
    },
    Closed,
}

/// HTTP server exposing lifecycle control of the supervised process.
pub struct AdminServer {
    listen_address: String,
    request_timeout: Duration,
    state: AdminState,
    lifecycle: Mutex<Lifecycle>,
}

impl AdminServer {
    /// Create a server for `listen_address` (`host:port`) wrapping `supervisor`.
    pub fn new(listen_address: impl Into<String>, supervisor: Arc<dyn ProcessSupervisor>) -> Self {
        Self {
            listen_address: listen_address.into(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            state: AdminState::new(supervisor),
            lifecycle: Mutex::new(Lifecycle::NotStarted),
        }
    }

    pub fn from_config(config: &AdminConfig, supervisor: Arc<dyn ProcessSupervisor>) -> Self {
        Self::new(config.listen_address(), supervisor)
            .with_request_timeout(Duration::from_secs(config.request_timeout_secs))
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Bind the listen address and serve until closed.
    ///
    /// Returns `Ok(())` once [`close`](AdminServer::close) stops the server.
    pub async fn start(&self) -> Result<(), AdminError> {
        let (listener, shutdown_rx) = {
            let mut lifecycle = self.lock();
            match &*lifecycle {
                Lifecycle::Closed => return Err(AdminError::AlreadyClosed),
                Lifecycle::Listening { local_addr, .. } => {
                    return Err(AdminError::AlreadyListening(*local_addr))
                }
                Lifecycle::NotStarted => {}
            }

            let (listener, local_addr) = self.bind()?;
            let (shutdown, shutdown_rx) = oneshot::channel();
            *lifecycle = Lifecycle::Listening {
                local_addr,
                shutdown,
            };

            tracing::info!(address = %local_addr, "Admin server listening");
            (listener, shutdown_rx)
        };

        let app = setup_admin_router(self.state.clone(), self.request_timeout);
        let result = axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                // A dropped sender also means shutdown.
                let _ = shutdown_rx.await;
            })
            .await;

        {
            let mut lifecycle = self.lock();
            if matches!(*lifecycle, Lifecycle::Listening { .. }) {
                *lifecycle = Lifecycle::Closed;
            }
        }

        tracing::info!("Admin server stopped");
        result.map_err(AdminError::Serve)
    }

    /// Stop the server. Idempotent; the server cannot be started afterwards.
    pub fn close(&self) -> Result<(), AdminError> {
        let previous = std::mem::replace(&mut *self.lock(), Lifecycle::Closed);

        if let Lifecycle::Listening {
            local_addr,
            shutdown,
        } = previous
        {
            let _ = shutdown.send(());
            tracing::info!(address = %local_addr, "Admin server closing");
        }
        Ok(())
    }

    /// Whether a listener is currently bound.
    pub fn listening(&self) -> bool {
        matches!(*self.lock(), Lifecycle::Listening { .. })
    }

    /// Bound `host:port`, or an empty string when not listening.
    pub fn addr(&self) -> String {
        match &*self.lock() {
            Lifecycle::Listening { local_addr, .. } => local_addr.to_string(),
            _ => String::new(),
        }
    }

    /// Most recent signal requested over HTTP.
    pub fn last_requested_signal(&self) -> RequestedSignal {
        self.state.last_signal.get()
    }

    /// Configured listen address.
    pub fn listen_address(&self) -> &str {
        &self.listen_address
    }

    fn bind(&self) -> Result<(TcpListener, SocketAddr), AdminError> {
        let bind_err = |source| AdminError::Bind {
            address: self.listen_address.clone(),
            source,
        };

        let std_listener = std::net::TcpListener::bind(&self.listen_address).map_err(bind_err)?;
        std_listener.set_nonblocking(true).map_err(bind_err)?;
        let listener = TcpListener::from_std(std_listener).map_err(bind_err)?;
        let local_addr = listener.local_addr().map_err(bind_err)?;
        Ok((listener, local_addr))
    }

    fn lock(&self) -> MutexGuard<'_, Lifecycle> {
        self.lifecycle.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::SupervisorError;

    struct Inert;

    impl ProcessSupervisor for Inert {
        fn kill(&self) -> Result<(), SupervisorError> {
            Ok(())
        }
        fn quit(&self) -> Result<(), SupervisorError> {
            Ok(())
        }
        fn hangup(&self) -> Result<(), SupervisorError> {
            Ok(())
        }
    }

    #[test]
    fn new_server_is_idle() {
        let server = AdminServer::new("localhost:1000", Arc::new(Inert));
        assert_eq!(server.listen_address(), "localhost:1000");
        assert!(!server.listening());
        assert_eq!(server.addr(), "");
        assert_eq!(server.last_requested_signal(), RequestedSignal::None);
    }

    #[tokio::test]
    async fn close_before_start_invalidates() {
        let server = AdminServer::new("127.0.0.1:0", Arc::new(Inert));
        server.close().unwrap();
        server.close().unwrap();

        assert!(matches!(server.start().await, Err(AdminError::AlreadyClosed)));
        assert!(!server.listening());
    }

    #[tokio::test]
    async fn bad_address_fails_to_bind() {
        let server = AdminServer::new("not an address", Arc::new(Inert));
        assert!(matches!(server.start().await, Err(AdminError::Bind { .. })));
        assert!(!server.listening());
    }
}
