//! Header manipulation between the caller hop and the upstream hop.
//!
//! # Responsibilities
//! - Strip hop-by-hop headers in both directions
//! - Point Host at the upstream
//! - Keep Content-Length in step with the (possibly rewritten) body
//!
//! Every other header, auth and API-version headers included, passes through untouched.

use axum::http::header::{CONTENT_LENGTH, HOST};
use axum::http::{HeaderMap, HeaderValue};

/// Headers that only describe the connection they arrived on.
pub const HOP_BY_HOP: [&str; 3] = ["connection", "keep-alive", "transfer-encoding"];

/// Remove every hop-by-hop header.
pub fn strip_hop_by_hop(headers: &mut HeaderMap) {
    for name in HOP_BY_HOP {
        headers.remove(name);
    }
}

/// Turn the caller's headers into the set sent upstream.
pub fn upstream_request_headers(mut headers: HeaderMap, host: &HeaderValue, body_len: usize) -> HeaderMap {
    strip_hop_by_hop(&mut headers);
    headers.insert(HOST, host.clone());

    headers.remove(CONTENT_LENGTH);
    if body_len > 0 {
        headers.insert(CONTENT_LENGTH, HeaderValue::from(body_len));
    }

    headers
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inbound() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(HOST, HeaderValue::from_static("127.0.0.1:8877"));
        headers.insert("connection", HeaderValue::from_static("keep-alive"));
        headers.insert("keep-alive", HeaderValue::from_static("timeout=5"));
        headers.insert("transfer-encoding", HeaderValue::from_static("chunked"));
        headers.insert(CONTENT_LENGTH, HeaderValue::from_static("9999"));
        headers.insert("x-api-key", HeaderValue::from_static("sk-test"));
        headers.insert("anthropic-version", HeaderValue::from_static("2023-06-01"));
        headers.append("anthropic-beta", HeaderValue::from_static("a"));
        headers.append("anthropic-beta", HeaderValue::from_static("b"));
        headers
    }

    #[test]
    fn sanitizes_and_rewrites() {
        let host = HeaderValue::from_static("api.example.com");
        let out = upstream_request_headers(inbound(), &host, 42);

        assert_eq!(out.get(HOST).unwrap(), "api.example.com");
        assert_eq!(out.get(CONTENT_LENGTH).unwrap(), "42");
        for name in HOP_BY_HOP {
            assert!(out.get(name).is_none(), "{} should be stripped", name);
        }
        assert_eq!(out.get("x-api-key").unwrap(), "sk-test");
        assert_eq!(out.get("anthropic-version").unwrap(), "2023-06-01");
        assert_eq!(out.get_all("anthropic-beta").iter().count(), 2);
    }

    #[test]
    fn no_length_without_body() {
        let host = HeaderValue::from_static("api.example.com");
        let out = upstream_request_headers(inbound(), &host, 0);
        assert!(out.get(CONTENT_LENGTH).is_none());
    }
}
