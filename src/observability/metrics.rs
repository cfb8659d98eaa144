//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define hub metrics (poll cycles, fetch latency, log size, alerts)
//! - Expose Prometheus-compatible metrics endpoint
//!
//! # Metrics
//! - `hub_poll_cycles_total` (counter): cycles by outcome
//! - `hub_source_failures_total` (counter): fetch failures by kind
//! - `hub_fetch_duration_seconds` (histogram): fetch latency distribution
//! - `hub_samples_appended_total` (counter): samples written to the log
//! - `hub_snapshot_size` (gauge): samples in the last snapshot
//! - `hub_alerts_active` (gauge): alerts raised by the latest sample
//! - `hub_http_requests_total` (counter): API requests by endpoint, status
//!
//! # Design Decisions
//! - Low-overhead metric updates (atomic operations)
//! - Exporter failure is logged and tolerated, never fatal

use std::net::SocketAddr;

use metrics::{
    counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram,
};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter on `addr` and register descriptions.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => {
            describe();
            tracing::info!(address = %addr, "Metrics exporter listening");
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to install metrics exporter");
        }
    }
}

fn describe() {
    describe_counter!("hub_poll_cycles_total", "Poll cycles completed, by outcome");
    describe_counter!("hub_source_failures_total", "Source fetch failures, by kind");
    describe_histogram!("hub_fetch_duration_seconds", "Source fetch latency");
    describe_counter!("hub_samples_appended_total", "Samples appended to the log");
    describe_gauge!("hub_snapshot_size", "Samples in the most recent snapshot");
    describe_gauge!("hub_alerts_active", "Alerts raised by the latest sample");
    describe_counter!("hub_http_requests_total", "API requests, by endpoint and status");
}

pub fn record_cycle(outcome: &'static str) {
    counter!("hub_poll_cycles_total", "outcome" => outcome).increment(1);
}

pub fn record_source_failure(kind: &'static str) {
    counter!("hub_source_failures_total", "kind" => kind).increment(1);
}

pub fn record_fetch_duration(seconds: f64) {
    histogram!("hub_fetch_duration_seconds").record(seconds);
}

pub fn record_append() {
    counter!("hub_samples_appended_total").increment(1);
}

pub fn record_snapshot_size(size: usize) {
    gauge!("hub_snapshot_size").set(size as f64);
}

pub fn record_active_alerts(count: usize) {
    gauge!("hub_alerts_active").set(count as f64);
}

pub fn record_api_request(endpoint: &str, status: u16) {
    counter!(
        "hub_http_requests_total",
        "endpoint" => endpoint.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}
