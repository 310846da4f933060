//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gate_requests_total` (counter): requests by route, status
//! - `gate_request_duration_seconds` (histogram): latency distribution
//! - `gate_rate_limited_total` (counter): rejections by route
//! - `gate_auth_failures_total` (counter): failed authentications by reason
//! - `gate_rate_table_entries` (gauge): tracked rate windows

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Start the Prometheus scrape endpoint. Must run inside a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(route: &str, status: u16, start: Instant) {
    ::metrics::counter!(
        "gate_requests_total",
        "route" => route.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    ::metrics::histogram!("gate_request_duration_seconds", "route" => route.to_string())
        .record(start.elapsed().as_secs_f64());
}

pub fn record_rate_limited(route: &str) {
    ::metrics::counter!("gate_rate_limited_total", "route" => route.to_string()).increment(1);
}

pub fn record_auth_failure(reason: &'static str) {
    ::metrics::counter!("gate_auth_failures_total", "reason" => reason).increment(1);
}

pub fn record_rate_table_size(entries: usize) {
    ::metrics::gauge!("gate_rate_table_entries").set(entries as f64);
}
