//! Metrics collection and exposition.
//!
//! # Metrics
//! - `honeycomb_events_submitted_total` (counter): events handed to a transmission
//! - `honeycomb_events_dropped_total` (counter): events rejected at submission, by reason
//! - `honeycomb_events_skipped_total` (counter): failed requests that produced no event
//! - `honeycomb_events_delivered_total` (counter): HTTP deliveries, by outcome
//! - `honeycomb_request_duration_seconds` (histogram): instrumented request latency
//!
//! # Design Decisions
//! - Uses the `metrics` facade; without an installed recorder every call is a no-op
//! - The Prometheus exporter is only installed by the server binary

use std::net::SocketAddr;
use std::time::Duration;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter listening on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_submitted() {
    counter!("honeycomb_events_submitted_total").increment(1);
}

pub fn record_dropped(reason: &'static str) {
    counter!("honeycomb_events_dropped_total", "reason" => reason).increment(1);
}

pub fn record_skipped() {
    counter!("honeycomb_events_skipped_total").increment(1);
}

pub fn record_delivery(success: bool) {
    let outcome = if success { "success" } else { "failure" };
    counter!("honeycomb_events_delivered_total", "outcome" => outcome).increment(1);
}

pub fn record_duration(elapsed: Duration) {
    histogram!("honeycomb_request_duration_seconds").record(elapsed.as_secs_f64());
}
