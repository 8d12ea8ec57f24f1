//! Compression service client.
//!
//! # Responsibilities
//! - Decide whether a text is worth a call at all
//! - Issue one bounded POST per text unit
//! - Accept the output only when it is actually smaller
//!
//! # Design Decisions
//! - Every failure resolves to the original text; nothing is surfaced to callers
//! - No retries and no caching between requests
//! - The deadline covers the whole exchange, body included

use std::time::Duration;

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};

use crate::compression::types::{
    CompressRequest, CompressResponse, CompressionError, CompressionResult, CompressionSettings,
    Outcome, SkipReason,
};
use crate::config::{CompressionConfig, OutboundConfig};
use crate::net::client::client_builder;

/// Stateless client for the compression endpoint.
#[derive(Debug, Clone)]
pub struct CompressionClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
    model: String,
    min_text_length: usize,
    timeout: Duration,
}

impl CompressionClient {
    pub fn new(config: &CompressionConfig, outbound: &OutboundConfig) -> Result<Self, reqwest::Error> {
        let http = client_builder(outbound).build()?;
        Ok(Self {
            http,
            endpoint: config.endpoint.clone(),
            api_key: config.api_key.clone().filter(|key| !key.is_empty()),
            model: config.model.clone(),
            min_text_length: config.min_text_length,
            timeout: config.timeout(),
        })
    }

    /// Minimum length (in characters) a text needs before it is sent.
    pub fn min_text_length(&self) -> usize {
        self.min_text_length
    }

    /// Compress `text`, falling back to it unchanged whenever the result
    /// cannot be obtained or is not an improvement.
    pub async fn compress(&self, text: &str, aggressiveness: f64) -> CompressionResult {
        let Some(api_key) = self.api_key.as_deref() else {
            return CompressionResult::fallback(text.to_string(), Outcome::Skipped(SkipReason::Disabled));
        };
        if text.is_empty() {
            return CompressionResult::fallback(text.to_string(), Outcome::Skipped(SkipReason::Empty));
        }
        let length = text.chars().count();
        if length < self.min_text_length {
            return CompressionResult::fallback(
                text.to_string(),
                Outcome::Skipped(SkipReason::BelowThreshold {
                    length,
                    min: self.min_text_length,
                }),
            );
        }

        let call = self.call(api_key, text, aggressiveness);
        let response = match tokio::time::timeout(self.timeout, call).await {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => return Self::failed(text, e),
            Err(_) => return Self::failed(text, CompressionError::Timeout(self.timeout.as_secs())),
        };

        CompressionResult::from_response(text, response)
    }

    async fn call(
        &self,
        api_key: &str,
        text: &str,
        aggressiveness: f64,
    ) -> Result<CompressResponse, CompressionError> {
        let body = CompressRequest {
            model: &self.model,
            compression_settings: CompressionSettings { aggressiveness },
            input: text,
        };

        let response = self
            .http
            .post(&self.endpoint)
            .header(AUTHORIZATION, format!("Bearer {}", api_key))
            .header(CONTENT_TYPE, "application/json")
            .json(&body)
            .send()
            .await
            .map_err(CompressionError::Transport)?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            return Err(CompressionError::Status(status));
        }

        response
            .json::<CompressResponse>()
            .await
            .map_err(CompressionError::Malformed)
    }

    /// The error travels in the outcome; the caller's event sink reports it.
    fn failed(text: &str, error: CompressionError) -> CompressionResult {
        CompressionResult::fallback(text.to_string(), Outcome::Failed(error))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(api_key: Option<&str>) -> CompressionClient {
        let config = CompressionConfig {
            api_key: api_key.map(str::to_string),
            // Nothing listens here; skipped texts must never reach it.
            endpoint: "http://127.0.0.1:9/compress".into(),
            ..CompressionConfig::default()
        };
        CompressionClient::new(&config, &OutboundConfig::default()).unwrap()
    }

    #[tokio::test]
    async fn disabled_without_key() {
        let text = "x".repeat(1000);
        let result = client(None).compress(&text, 0.6).await;
        assert_eq!(result.text, text);
        assert_eq!((result.tokens_saved, result.original_tokens), (0, 0));
        assert!(matches!(result.outcome, Outcome::Skipped(SkipReason::Disabled)));
    }

    #[tokio::test]
    async fn skips_empty_and_short_text() {
        let client = client(Some("key"));

        let result = client.compress("", 0.6).await;
        assert!(matches!(result.outcome, Outcome::Skipped(SkipReason::Empty)));

        let short = "é".repeat(149);
        let result = client.compress(&short, 0.6).await;
        assert_eq!(result.text, short);
        assert!(matches!(
            result.outcome,
            Outcome::Skipped(SkipReason::BelowThreshold { length: 149, min: 150 })
        ));
    }

    #[tokio::test]
    async fn transport_failure_falls_back() {
        let text = "y".repeat(300);
        let result = client(Some("key")).compress(&text, 0.6).await;
        assert_eq!(result.text, text);
        assert_eq!(result.tokens_saved, 0);
        assert!(matches!(result.outcome, Outcome::Failed(_)));
    }

    /// Serve a fixed status and raw body on `/compress`.
    async fn spawn_endpoint(status: u16, body: &'static str) -> String {
        use axum::{http::StatusCode, routing::post, Router};

        let status = StatusCode::from_u16(status).unwrap();
        let app = Router::new().route(
            "/compress",
            post(move || async move { (status, [("content-type", "application/json")], body) }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}/compress", addr)
    }

    fn client_for(endpoint: String) -> CompressionClient {
        let config = CompressionConfig {
            api_key: Some("key".into()),
            endpoint,
            ..CompressionConfig::default()
        };
        let outbound = OutboundConfig {
            use_system_proxy: false,
            ..OutboundConfig::default()
        };
        CompressionClient::new(&config, &outbound).unwrap()
    }

    #[tokio::test]
    async fn non_json_body_falls_back() {
        let text = "p".repeat(300);
        let client = client_for(spawn_endpoint(200, "<html>oops</html>").await);
        let result = client.compress(&text, 0.6).await;
        assert_eq!(result.text, text);
        assert_eq!((result.tokens_saved, result.original_tokens), (0, 0));
        assert!(matches!(result.outcome, Outcome::Failed(CompressionError::Malformed(_))));
    }

    #[tokio::test]
    async fn wrongly_typed_fields_fall_back() {
        let text = "q".repeat(300);
        let client = client_for(spawn_endpoint(200, r#"{"output":5}"#).await);
        let result = client.compress(&text, 0.6).await;
        assert_eq!(result.text, text);
        assert_eq!((result.tokens_saved, result.original_tokens), (0, 0));
        assert!(matches!(result.outcome, Outcome::Failed(CompressionError::Malformed(_))));
    }

    #[tokio::test]
    async fn error_status_falls_back() {
        let text = "r".repeat(300);
        let body = r#"{"output":"s","output_tokens":1,"original_input_tokens":100}"#;
        let client = client_for(spawn_endpoint(500, body).await);
        let result = client.compress(&text, 0.6).await;
        assert_eq!(result.text, text);
        assert_eq!((result.tokens_saved, result.original_tokens), (0, 0));
        assert!(matches!(
            result.outcome,
            Outcome::Failed(CompressionError::Status(status)) if status.as_u16() == 500
        ));
    }
}
