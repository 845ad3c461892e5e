//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define framework metrics (requests, latency, stage failures)
//! - Expose Prometheus-compatible metrics endpoint
//!
//! # Metrics
//! - `mvc_requests_total` (counter): requests by method, status, handler
//! - `mvc_request_duration_seconds` (histogram): latency distribution
//! - `mvc_stage_failures_total` (counter): failed lifecycle stages by stage
//!
//! # Design Decisions
//! - Low-overhead metric updates through the `metrics` facade; without an
//!   installed recorder every call is a no-op
//! - Labels are bounded: method, status code, handler and stage names only

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and its scrape endpoint.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

/// Record one finished request.
pub fn record_request(method: &str, status: u16, handler: &str, start: Instant) {
    let status = status.to_string();
    metrics::counter!(
        "mvc_requests_total",
        "method" => method.to_string(),
        "status" => status.clone(),
        "handler" => handler.to_string()
    )
    .increment(1);
    metrics::histogram!(
        "mvc_request_duration_seconds",
        "method" => method.to_string(),
        "status" => status,
        "handler" => handler.to_string()
    )
    .record(start.elapsed().as_secs_f64());
}

/// Record a lifecycle stage that ended the request with an error.
pub fn record_stage_failure(stage: &'static str) {
    metrics::counter!("mvc_stage_failures_total", "stage" => stage).increment(1);
}
