//! Metrics collection and exposition.
//!
//! # Metrics
//! - `bridge_messages_total` (counter): inbound messages
//! - `bridge_messages_dropped_total` (counter): dropped messages by reason
//! - `bridge_upstream_requests_total` (counter): HTTP calls by method, outcome
//! - `bridge_upstream_request_duration_seconds` (histogram): HTTP latency
//! - `bridge_responses_published_total` (counter): relayed GET responses
//! - `bridge_routes` (gauge): routes in the table
//! - `bridge_transport_connected` / `bridge_peer_connected` (gauge): 1/0

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its HTTP listener.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_message_received() {
    metrics::counter!("bridge_messages_total").increment(1);
}

pub fn record_message_dropped(reason: &'static str) {
    metrics::counter!("bridge_messages_dropped_total", "reason" => reason).increment(1);
}

pub fn record_upstream_request(method: &'static str, outcome: &'static str, start: Instant) {
    metrics::counter!("bridge_upstream_requests_total", "method" => method, "outcome" => outcome).increment(1);
    metrics::histogram!("bridge_upstream_request_duration_seconds", "method" => method)
        .record(start.elapsed().as_secs_f64());
}

pub fn record_response_published() {
    metrics::counter!("bridge_responses_published_total").increment(1);
}

pub fn record_route_count(count: usize) {
    metrics::gauge!("bridge_routes").set(count as f64);
}

pub fn record_transport_connected(connected: bool) {
    metrics::gauge!("bridge_transport_connected").set(if connected { 1.0 } else { 0.0 });
}

pub fn record_peer_connected(connected: bool) {
    metrics::gauge!("bridge_peer_connected").set(if connected { 1.0 } else { 0.0 });
}
