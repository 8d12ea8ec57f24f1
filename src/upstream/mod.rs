//! Upstream subsystem.
//!
//! # Data Flow
//! ```text
//! method, path, headers, (possibly rewritten) body
//!     → headers.rs (Host rewrite, hop-by-hop removal, Content-Length)
//!     → forwarder.rs (TLS request to the real API)
//!     → status + headers relayed, body streamed to the caller
//!
//! On transport failure:
//!     → ForwardError → 502 with a short JSON diagnostic
//! ```

pub mod forwarder;
pub mod headers;

use axum::http::header::InvalidHeaderValue;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

pub use forwarder::UpstreamForwarder;

/// Failure to reach or talk to the upstream.
#[derive(Debug, Error)]
pub enum ForwardError {
    #[error("invalid upstream target '{0}'")]
    InvalidTarget(String),

    #[error("invalid upstream host: {0}")]
    InvalidHost(#[from] InvalidHeaderValue),

    #[error("failed to build upstream client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("upstream request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

impl IntoResponse for ForwardError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({
            "error": "Bad Gateway",
            "message": self.to_string(),
        });
        (StatusCode::BAD_GATEWAY, Json(body)).into_response()
    }
}
