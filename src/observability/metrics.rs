//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_requests_total` (counter): requests by method, route, status
//! - `gateway_request_duration_seconds` (histogram): latency by route
//! - `gateway_upstream_errors_total` (counter): proxy failures by route, kind
//!
//! Without an installed recorder the macros are no-ops.

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

pub mod names {
    pub const REQUESTS_TOTAL: &str = "gateway_requests_total";
    pub const REQUEST_DURATION_SECONDS: &str = "gateway_request_duration_seconds";
    pub const UPSTREAM_ERRORS_TOTAL: &str = "gateway_upstream_errors_total";
}

/// Start the Prometheus exporter on `addr`. Must run inside a Tokio runtime.
///
/// Returns `false` if the exporter could not be installed.
pub fn init_metrics(addr: SocketAddr) -> bool {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => {
            tracing::info!(address = %addr, "Prometheus metrics exporter started");
            true
        }
        Err(e) => {
            tracing::error!(address = %addr, error = %e, "Failed to install Prometheus exporter");
            false
        }
    }
}

/// Record a finished request.
pub fn record_request(method: &str, status: u16, route: &str, start_time: Instant) {
    counter!(
        names::REQUESTS_TOTAL,
        "method" => method.to_string(),
        "route" => route.to_string(),
        "status" => status.to_string()
    )
    .increment(1);

    histogram!(
        names::REQUEST_DURATION_SECONDS,
        "route" => route.to_string()
    )
    .record(start_time.elapsed().as_secs_f64());
}

/// Record a request that failed before a response came back.
pub fn record_upstream_error(route: &str, kind: &'static str) {
    counter!(
        names::UPSTREAM_ERRORS_TOTAL,
        "route" => route.to_string(),
        "kind" => kind
    )
    .increment(1);
}
