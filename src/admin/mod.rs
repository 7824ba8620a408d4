//! Admin control subsystem.
//!
//! # Routes
//! ```text
//! GET /admin/kill    → supervisor.kill()    → 200 "OK\n" | 500 "FAILED: <err>\n"
//! GET /admin/quit    → supervisor.quit()    → 200 "OK\n" | 500 "FAILED: <err>\n"
//! GET /admin/reload  → supervisor.hangup()  → 200 "OK\n" | 500 "FAILED: <err>\n"
//! anything else      → 404 "NOT FOUND\n"
//! ```
//!
//! The requested signal is recorded before the supervisor is called, so it
//! reflects intent even when the call fails.

pub mod handlers;
pub mod server;
pub mod signal;

use axum::Router;
use std::time::Duration;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

pub use self::handlers::{AdminAction, AdminState};
pub use self::server::{AdminError, AdminServer};
pub use self::signal::{RequestedSignal, SignalRecord};

use self::handlers::admin_handler;

/// Build the admin router. Every request goes through one handler so that
/// method and path are checked together.
#[allow(deprecated)]
pub fn setup_admin_router(state: AdminState, request_timeout: Duration) -> Router {
    Router::new()
        .fallback(admin_handler)
        .with_state(state)
        .layer(TimeoutLayer::new(request_timeout))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(TraceLayer::new_for_http())
}
