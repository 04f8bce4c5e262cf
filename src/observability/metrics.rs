//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_requests_total` (counter): requests by method, status
//! - `gateway_rejections_total` (counter): early rejections by gate
//! - `gateway_request_duration_seconds` (histogram): end-to-end latency
//! - `gateway_rate_limit_sweep_removed` (counter): entries freed by sweeps

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and scrape endpoint.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint started"),
        Err(err) => tracing::error!(error = %err, "Failed to install metrics exporter"),
    }
}

/// Record one completed request (admitted or rejected).
pub fn record_request(method: &str, status: u16, start: Instant) {
    counter!(
        "gateway_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string(),
    )
    .increment(1);
    histogram!("gateway_request_duration_seconds").record(start.elapsed().as_secs_f64());
}

/// Record an early rejection at the named gate.
pub fn record_rejection(gate: &'static str) {
    counter!("gateway_rejections_total", "gate" => gate).increment(1);
}

/// Record the outcome of one rate-limit sweep.
pub fn record_sweep(removed: usize) {
    counter!("gateway_rate_limit_sweep_removed").increment(removed as u64);
}
