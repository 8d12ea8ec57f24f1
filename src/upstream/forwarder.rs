//! Upstream forwarding.
//!
//! # Responsibilities
//! - Build the outbound request (target URL, sanitized headers, full body)
//! - Relay status and headers as soon as the upstream answers
//! - Stream the upstream body to the caller chunk by chunk
//!
//! # Design Decisions
//! - No retries: message submissions are not idempotent
//! - The response body is never buffered, so incremental output reaches the caller live
//! - Only a per-read timeout applies, long generations are not cut off

use std::time::Duration;

use axum::body::{Body, Bytes};
use axum::http::{HeaderMap, HeaderValue, Method};
use axum::response::Response;
use futures_util::TryStreamExt;
use url::Url;

use crate::config::{OutboundConfig, UpstreamConfig};
use crate::net::client::client_builder;
use crate::upstream::headers::{strip_hop_by_hop, upstream_request_headers};
use crate::upstream::ForwardError;

/// Sends requests to the real API and relays its responses.
#[derive(Debug, Clone)]
pub struct UpstreamForwarder {
    http: reqwest::Client,
    base_url: String,
    host: HeaderValue,
}

impl UpstreamForwarder {
    pub fn new(config: &UpstreamConfig, outbound: &OutboundConfig) -> Result<Self, ForwardError> {
        let base = Url::parse(&config.base_url)
            .map_err(|_| ForwardError::InvalidTarget(config.base_url.clone()))?;
        let host = match (base.host_str(), base.port()) {
            (Some(host), Some(port)) => format!("{}:{}", host, port),
            (Some(host), None) => host.to_string(),
            (None, _) => return Err(ForwardError::InvalidTarget(config.base_url.clone())),
        };

        let http = client_builder(outbound)
            .read_timeout(Duration::from_secs(config.read_timeout_secs))
            .build()
            .map_err(ForwardError::Client)?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            host: HeaderValue::from_str(&host)?,
        })
    }

    /// Host header value sent upstream.
    pub fn host(&self) -> &HeaderValue {
        &self.host
    }

    /// Absolute upstream URL for an inbound path and query.
    pub fn target(&self, path_and_query: &str) -> Result<Url, ForwardError> {
        let target = format!("{}{}", self.base_url, path_and_query);
        Url::parse(&target).map_err(|_| ForwardError::InvalidTarget(target))
    }

    /// Forward one request and stream back the upstream response.
    pub async fn forward(
        &self,
        method: Method,
        path_and_query: &str,
        headers: HeaderMap,
        body: Bytes,
    ) -> Result<Response, ForwardError> {
        let url = self.target(path_and_query)?;
        let headers = upstream_request_headers(headers, &self.host, body.len());

        let mut request = self.http.request(method, url.clone()).headers(headers);
        if !body.is_empty() {
            request = request.body(body);
        }

        let upstream = request.send().await?;

        let status = upstream.status();
        let mut response_headers = upstream.headers().clone();
        strip_hop_by_hop(&mut response_headers);

        tracing::debug!(url = %url, status = %status, "Upstream responded");

        let stream = upstream.bytes_stream().inspect_err(move |e| {
            tracing::warn!(url = %url, error = %e, "Upstream body stream interrupted");
        });

        let mut response = Response::new(Body::from_stream(stream));
        *response.status_mut() = status;
        *response.headers_mut() = response_headers;
        Ok(response)
    }
}
