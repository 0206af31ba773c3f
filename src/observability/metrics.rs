//! Metrics collection and exposition.
//!
//! # Metrics
//! - `redirect_outcomes_total` (counter): resolved requests by outcome
//! - `redirect_failures_total` (counter): unresolved legacy requests by reason
//! - `redirect_resolve_duration_seconds` (histogram): resolution latency
//! - `redirect_table_loads_total` (counter): table fetch attempts by result
//! - `redirect_table_load_duration_seconds` (histogram): fetch + parse latency
//! - `redirect_origin_requests_total` (counter): forwarded requests by status

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its HTTP listener.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => {
            tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter")
        }
    }
}

/// Record the outcome of one resolution.
pub fn record_outcome(outcome: &'static str, start: Instant) {
    counter!("redirect_outcomes_total", "outcome" => outcome).increment(1);
    histogram!("redirect_resolve_duration_seconds", "outcome" => outcome)
        .record(start.elapsed().as_secs_f64());
}

/// Record why a legacy request ended in `NotFound`.
pub fn record_failure(reason: &'static str) {
    counter!("redirect_failures_total", "reason" => reason).increment(1);
}

/// Record one table fetch attempt.
pub fn record_table_load(result: &'static str, start: Instant) {
    counter!("redirect_table_loads_total", "result" => result).increment(1);
    histogram!("redirect_table_load_duration_seconds").record(start.elapsed().as_secs_f64());
}

/// Record a request forwarded to the origin.
pub fn record_origin_request(status: u16, start: Instant) {
    counter!("redirect_origin_requests_total", "status" => status.to_string()).increment(1);
    histogram!("redirect_origin_duration_seconds").record(start.elapsed().as_secs_f64());
}
