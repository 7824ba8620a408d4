//! Metrics collection and exposition.
//!
//! # Metrics
//! - `sidecar_admin_requests_total` (counter): admin requests by signal, outcome
//! - `sidecar_log_rotations_total` (counter): files rotated
//! - `sidecar_log_rotation_errors_total` (counter): failed rotations
//! - `sidecar_log_files_pruned_total` (counter): rotated files deleted
//! - `sidecar_reopen_failures_total` (counter): failed reopen hooks
//!
//! Recording is a no-op until a recorder is installed with [`init_metrics`].

use std::net::SocketAddr;

use metrics::counter;
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter listening on `addr`.
///
/// Failures are logged; the sidecar keeps running without metrics.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_admin_request(signal: &'static str, outcome: &'static str) {
    counter!("sidecar_admin_requests_total", "signal" => signal, "outcome" => outcome).increment(1);
}

pub fn record_rotation() {
    counter!("sidecar_log_rotations_total").increment(1);
}

pub fn record_rotation_error() {
    counter!("sidecar_log_rotation_errors_total").increment(1);
}

pub fn record_pruned(count: u64) {
    if count > 0 {
        counter!("sidecar_log_files_pruned_total").increment(count);
    }
}

pub fn record_reopen_failure() {
    counter!("sidecar_reopen_failures_total").increment(1);
}
