//! Metrics collection and exposition.
//!
//! # Metrics
//! - `sign_init_total` (counter): client initializations by outcome
//! - `sign_connect_total` (counter): connect attempts by outcome
//! - `sign_disconnect_total` (counter): disconnects by remote outcome
//! - `sign_request_total` (counter): wallet requests by outcome
//! - `sign_session_active` (gauge): 1 while a session is held
//!
//! Without an installed recorder every call is a no-op.

use std::net::SocketAddr;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Serve Prometheus metrics on `addr`. Must run inside the Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

fn outcome(ok: bool) -> &'static str {
    if ok {
        "ok"
    } else {
        "error"
    }
}

pub fn record_init(ok: bool) {
    ::metrics::counter!("sign_init_total", "outcome" => outcome(ok)).increment(1);
}

/// `outcome` is one of approved, cancelled, timeout, failed.
pub fn record_connect(outcome: &'static str) {
    ::metrics::counter!("sign_connect_total", "outcome" => outcome).increment(1);
}

pub fn record_disconnect(remote_ok: bool) {
    ::metrics::counter!("sign_disconnect_total", "outcome" => outcome(remote_ok)).increment(1);
}

pub fn record_request(ok: bool) {
    ::metrics::counter!("sign_request_total", "outcome" => outcome(ok)).increment(1);
}

pub fn set_session_active(active: bool) {
    ::metrics::gauge!("sign_session_active").set(if active { 1.0 } else { 0.0 });
}
