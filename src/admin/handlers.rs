use axum::{
    extract::State,
    http::{header, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use crate::admin::signal::{RequestedSignal, SignalRecord};
use crate::observability::metrics;
use crate::process::{ProcessSupervisor, SupervisorError};

/// State shared by admin request handlers.
#[derive(Clone)]
pub struct AdminState {
    pub supervisor: Arc<dyn ProcessSupervisor>,
    pub last_signal: Arc<SignalRecord>,
}

impl AdminState {
    pub fn new(supervisor: Arc<dyn ProcessSupervisor>) -> Self {
        Self {
            supervisor,
            last_signal: Arc::new(SignalRecord::new()),
        }
    }
}

/// Operation behind each admin path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminAction {
    Kill,
    Quit,
    Reload,
}

impl AdminAction {
    pub fn from_path(path: &str) -> Option<Self> {
        match path {
            "/admin/kill" => Some(AdminAction::Kill),
            "/admin/quit" => Some(AdminAction::Quit),
            "/admin/reload" => Some(AdminAction::Reload),
            _ => None,
        }
    }

    pub fn requested_signal(self) -> RequestedSignal {
        match self {
            AdminAction::Kill => RequestedSignal::Kill,
            AdminAction::Quit => RequestedSignal::Quit,
            AdminAction::Reload => RequestedSignal::Hangup,
        }
    }

    fn invoke(self, supervisor: &dyn ProcessSupervisor) -> Result<(), SupervisorError> {
        match self {
            AdminAction::Kill => supervisor.kill(),
            AdminAction::Quit => supervisor.quit(),
            AdminAction::Reload => supervisor.hangup(),
        }
    }
}

/// Single entry point for every admin request.
///
/// Only `GET` on one of the three admin paths reaches the supervisor;
/// everything else is answered with 404 and has no side effect.
pub async fn admin_handler(
    State(state): State<AdminState>,
    method: Method,
    uri: Uri,
) -> Response {
    let action = match AdminAction::from_path(uri.path()) {
        Some(action) if method == Method::GET => action,
        _ => {
            tracing::debug!(method = %method, path = %uri.path(), "Admin path not found");
            metrics::record_admin_request("none", "not_found");
            return plain_text(StatusCode::NOT_FOUND, "NOT FOUND\n".to_string());
        }
    };

    let signal = action.requested_signal();
    state.last_signal.set(signal);

    match action.invoke(state.supervisor.as_ref()) {
        Ok(()) => {
            tracing::info!(signal = %signal, "Admin request succeeded");
            metrics::record_admin_request(signal.as_str(), "ok");
            plain_text(StatusCode::OK, "OK\n".to_string())
        }
        Err(e) => {
            tracing::error!(signal = %signal, error = %e, "Admin request failed");
            metrics::record_admin_request(signal.as_str(), "failed");
            plain_text(StatusCode::INTERNAL_SERVER_ERROR, format!("FAILED: {}\n", e))
        }
    }
}

fn plain_text(status: StatusCode, body: String) -> Response {
    (status, [(header::CONTENT_TYPE, "text/plain")], body).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::admin::setup_admin_router;
    use axum::body::Body;
    use axum::http::Request;
    use std::sync::Mutex;
    use std::time::Duration;
    use tower::ServiceExt;

    #[derive(Default)]
    struct FakeSupervisor {
        calls: Mutex<Vec<&'static str>>,
        failure: Option<&'static str>,
    }

    impl FakeSupervisor {
        fn record(&self, op: &'static str) -> Result<(), SupervisorError> {
            self.calls.lock().unwrap().push(op);
            match self.failure {
                Some(msg) => Err(SupervisorError::Other(msg.to_string())),
                None => Ok(()),
            }
        }
    }

    impl ProcessSupervisor for FakeSupervisor {
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

    async fn send(
        supervisor: Arc<FakeSupervisor>,
        method: Method,
        path: &str,
    ) -> (StatusCode, String, RequestedSignal) {
        let state = AdminState::new(supervisor);
        let last = state.last_signal.clone();
        let router = setup_admin_router(state, Duration::from_secs(10));

        let request = Request::builder()
            .method(method)
            .uri(path)
            .body(Body::empty())
            .unwrap();
        let response = router.oneshot(request).await.unwrap();
        let status = response.status();
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "text/plain"
        );
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap(), last.get())
    }

    #[tokio::test]
    async fn routes_map_to_supervisor_operations() {
        for (path, op, signal) in [
            ("/admin/kill", "kill", RequestedSignal::Kill),
            ("/admin/quit", "quit", RequestedSignal::Quit),
            ("/admin/reload", "hangup", RequestedSignal::Hangup),
        ] {
            let supervisor = Arc::new(FakeSupervisor::default());
            let (status, body, last) = send(supervisor.clone(), Method::GET, path).await;

            assert_eq!(status, StatusCode::OK);
            assert_eq!(body, "OK\n");
            assert_eq!(last, signal);
            assert_eq!(*supervisor.calls.lock().unwrap(), vec![op]);
        }
    }

    #[tokio::test]
    async fn failure_reports_error_and_records_intent() {
        let supervisor = Arc::new(FakeSupervisor {
            failure: Some("oops"),
            ..Default::default()
        });
        let (status, body, last) = send(supervisor, Method::GET, "/admin/quit").await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, "FAILED: oops\n");
        assert_eq!(last, RequestedSignal::Quit);
    }

    #[tokio::test]
    async fn unknown_path_is_not_found() {
        for method in [Method::GET, Method::POST, Method::DELETE] {
            let supervisor = Arc::new(FakeSupervisor::default());
            let (status, body, last) = send(supervisor, method, "/unknown/path").await;
            assert_eq!(status, StatusCode::NOT_FOUND);
            assert_eq!(body, "NOT FOUND\n");
            assert_eq!(last, RequestedSignal::None);
        }
    }

    #[tokio::test]
    async fn non_get_on_admin_path_has_no_side_effect() {
        for method in [Method::POST, Method::PUT, Method::HEAD, Method::DELETE] {
            let supervisor = Arc::new(FakeSupervisor::default());
            let (status, _, last) = send(supervisor.clone(), method, "/admin/kill").await;

            assert_eq!(status, StatusCode::NOT_FOUND);
            assert_eq!(last, RequestedSignal::None);
            assert!(supervisor.calls.lock().unwrap().is_empty());
        }
    }

    #[tokio::test]
    async fn subpaths_are_not_found() {
        let supervisor = Arc::new(FakeSupervisor::default());
        let (status, _, _) = send(supervisor.clone(), Method::GET, "/admin/kill/now").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(supervisor.calls.lock().unwrap().is_empty());
    }
}
