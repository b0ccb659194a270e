//! Metrics collection and exposition.
//!
//! # Metrics
//! - `relay_requests_total` (counter): generation requests by status
//! - `relay_request_duration_seconds` (histogram): end-to-end latency
//! - `relay_clients_created_total` (counter): upstream clients constructed
//! - `relay_client_cache_size` (gauge): credentials currently cached

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape listener.
///
/// Must run inside a Tokio runtime. Failure is logged, not fatal.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

/// Record a finished generation request.
pub fn record_request(status: u16, start: Instant) {
    counter!("relay_requests_total", "status" => status.to_string()).increment(1);
    histogram!("relay_request_duration_seconds").record(start.elapsed().as_secs_f64());
}

pub fn record_client_created() {
    counter!("relay_clients_created_total").increment(1);
}

pub fn record_cache_size(size: usize) {
    gauge!("relay_client_cache_size").set(size as f64);
}
