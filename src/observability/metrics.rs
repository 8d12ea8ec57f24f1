//! Metrics collection and exposition.
//!
//! # Metrics
//! - `prompt_squeeze_requests_total` (counter): every inbound request
//! - `prompt_squeeze_compressed_requests_total` (counter): requests that saved tokens
//! - `prompt_squeeze_tokens_saved_total` (counter)
//! - `prompt_squeeze_original_tokens_total` (counter)
//! - `prompt_squeeze_upstream_failures_total` (counter)
//!
//! Recording is a no-op until [`init_metrics`] installs the Prometheus recorder.

use std::net::SocketAddr;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape endpoint.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request() {
    metrics::counter!("prompt_squeeze_requests_total").increment(1);
}

pub fn record_savings(tokens_saved: u64, original_tokens: u64) {
    metrics::counter!("prompt_squeeze_tokens_saved_total").increment(tokens_saved);
    metrics::counter!("prompt_squeeze_original_tokens_total").increment(original_tokens);
    if tokens_saved > 0 {
        metrics::counter!("prompt_squeeze_compressed_requests_total").increment(1);
    }
}

pub fn record_upstream_failure() {
    metrics::counter!("prompt_squeeze_upstream_failures_total").increment(1);
}
