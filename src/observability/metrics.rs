//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define server metrics (requests, latency, document I/O)
//! - Expose Prometheus-compatible metrics endpoint
//!
//! # Metrics
//! - `jsondb_requests_total` (counter): requests by method, status
//! - `jsondb_request_duration_seconds` (histogram): latency by method
//! - `jsondb_document_writes_total` (counter): persisted mutations
//! - `jsondb_document_load_failures_total` (counter): unreadable document
//!
//! # Design Decisions
//! - Without an installed recorder every call is a no-op
//! - Labels kept low-cardinality: no paths

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};
use std::net::SocketAddr;
use std::time::Instant;

/// Install the Prometheus recorder and serve it on `addr`.
///
/// Must be called from inside the Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

/// Record one answered request.
pub fn record_request(method: &str, status: u16, start: Instant) {
    let labels = [
        ("method", method.to_string()),
        ("status", status.to_string()),
    ];
    counter!("jsondb_requests_total", &labels).increment(1);
    histogram!("jsondb_request_duration_seconds", "method" => method.to_string())
        .record(start.elapsed().as_secs_f64());
}

pub fn record_document_write() {
    counter!("jsondb_document_writes_total").increment(1);
}

pub fn record_load_failure() {
    counter!("jsondb_document_load_failures_total").increment(1);
}
