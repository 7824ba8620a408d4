//! Shared utilities for integration tests.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use admin_sidecar::admin::{AdminError, AdminServer};
use admin_sidecar::process::{ProcessSupervisor, SupervisorError};
use tokio::task::JoinHandle;

/// Supervisor that records calls and optionally fails them.
#[allow(dead_code)]
#[derive(Default)]
pub struct RecordingSupervisor {
    calls: Mutex<Vec<&'static str>>,
    failure: Mutex<Option<String>>,
}

#[allow(dead_code)]
impl RecordingSupervisor {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing(message: &str) -> Arc<Self> {
        let supervisor = Self::default();
        *supervisor.failure.lock().unwrap() = Some(message.to_string());
        Arc::new(supervisor)
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, op: &'static str) -> Result<(), SupervisorError> {
        self.calls.lock().unwrap().push(op);
        match self.failure.lock().unwrap().clone() {
            Some(message) => Err(SupervisorError::Other(message)),
            None => Ok(()),
        }
    }
}

impl ProcessSupervisor for RecordingSupervisor {
    fn kill(&self) -> Result<(), SupervisorError> {
        self.record("kill")
    }

    fn quit(&self) -> Result<(), SupervisorError> {
        self.record("quit")
    }

    fn hangup(&self) -> Result<(), SupervisorError> {
        self.record("hangup")
    }
}

/// Start an admin server on an ephemeral port and wait until it listens.
#[allow(dead_code)]
pub async fn start_admin_server(
    supervisor: Arc<RecordingSupervisor>,
) -> (Arc<AdminServer>, JoinHandle<Result<(), AdminError>>) {
    let server = Arc::new(AdminServer::new("127.0.0.1:0", supervisor));
    let serving = Arc::clone(&server);
    let handle = tokio::spawn(async move { serving.start().await });

    for _ in 0..200 {
        if server.listening() {
            return (server, handle);
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("admin server did not start listening");
}

/// HTTP client that never pools or proxies.
#[allow(dead_code)]
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
