//! Metrics collection and exposition.
//!
//! # Metrics
//! - `proxy_requests_total` (counter): requests by method and status
//! - `proxy_request_duration_seconds` (histogram): latency distribution
//! - `proxy_backend_selections_total` (counter): selections per backend
//! - `proxy_no_live_backend_total` (counter): requests refused with 503
//! - `proxy_backend_alive` (gauge): 1=alive, 0=dead
//!
//! Recording is a no-op until [`init_metrics`] installs the exporter.

use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Instant;

/// Install the Prometheus exporter with its own HTTP listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(method: &str, status: u16, start: Instant) {
    metrics::counter!(
        "proxy_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    metrics::histogram!("proxy_request_duration_seconds", "method" => method.to_string())
        .record(start.elapsed().as_secs_f64());
}

pub fn record_selection(backend: &str) {
    metrics::counter!("proxy_backend_selections_total", "backend" => backend.to_string())
        .increment(1);
}

pub fn record_no_live_backend() {
    metrics::counter!("proxy_no_live_backend_total").increment(1);
}

pub fn record_backend_alive(backend: &str, alive: bool) {
    metrics::gauge!("proxy_backend_alive", "backend" => backend.to_string())
        .set(if alive { 1.0 } else { 0.0 });
}
