//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_requests_total` (counter): requests by outcome and status
//! - `gateway_request_duration_seconds` (histogram): dispatch latency
//! - `gateway_connectors` (gauge): live connector count
//! - `gateway_context_paths_announced_total` (counter): path broadcasts
//!
//! Recording is a no-op until `init_metrics` installs the exporter.

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

use crate::dispatch::DispatchOutcome;

/// Install the Prometheus exporter listening on `addr`.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

pub fn record_dispatch(outcome: &DispatchOutcome, started: Instant) {
    counter!(
        "gateway_requests_total",
        "outcome" => outcome.label(),
        "status" => outcome.status().as_u16().to_string()
    )
    .increment(1);
    histogram!("gateway_request_duration_seconds", "outcome" => outcome.label())
        .record(started.elapsed().as_secs_f64());
}

pub fn set_connector_count(count: usize) {
    gauge!("gateway_connectors").set(count as f64);
}

pub fn record_path_announced() {
    counter!("gateway_context_paths_announced_total").increment(1);
}
