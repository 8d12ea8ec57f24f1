//! HTTP server setup and the proxy front end.
//!
//! # Responsibilities
//! - Create Axum Router with the catch-all proxy handler
//! - Wire up middleware (tracing, body limit)
//! - Buffer the inbound body and classify the request
//! - Run eligible bodies through the payload transformer
//! - Hand every request to the upstream forwarder
//! - Keep lifetime stats

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, DefaultBodyLimit, State},
    http::{HeaderMap, Method, Uri},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::trace::TraceLayer;
use tracing::Instrument;
use uuid::Uuid;

use crate::compression::CompressionClient;
use crate::config::ProxyConfig;
use crate::observability::{metrics, EventSink, LifetimeStats, ProxyEvent, TracingSink};
use crate::payload::PayloadTransformer;
use crate::upstream::{ForwardError, UpstreamForwarder};

/// Path fragment identifying the message-submission endpoint.
pub const MESSAGES_PATH_MARKER: &str = "/messages";

/// True when a request's body should go through the transformer.
pub fn is_eligible(method: &Method, path: &str) -> bool {
    method == Method::POST && path.contains(MESSAGES_PATH_MARKER)
}

/// Error building the server's outbound clients.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to build compression client: {0}")]
    Compression(#[source] reqwest::Error),

    #[error(transparent)]
    Upstream(#[from] ForwardError),
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub transformer: Arc<PayloadTransformer>,
    pub forwarder: Arc<UpstreamForwarder>,
    pub stats: Arc<LifetimeStats>,
    pub events: Arc<dyn EventSink>,
}

/// HTTP server for the compressing proxy.
pub struct HttpServer {
    router: Router,
    stats: Arc<LifetimeStats>,
}

impl HttpServer {
    /// Create a server that reports events through `tracing`.
    pub fn new(config: &ProxyConfig) -> Result<Self, ServerError> {
        Self::with_events(config, Arc::new(TracingSink))
    }

    /// Create a server with an explicit event sink.
    pub fn with_events(config: &ProxyConfig, events: Arc<dyn EventSink>) -> Result<Self, ServerError> {
        Self::with_parts(config, events, Arc::new(LifetimeStats::new()))
    }

    /// Create a server around existing lifetime stats.
    pub fn with_parts(
        config: &ProxyConfig,
        events: Arc<dyn EventSink>,
        stats: Arc<LifetimeStats>,
    ) -> Result<Self, ServerError> {
        let client = CompressionClient::new(&config.compression, &config.outbound)
            .map_err(ServerError::Compression)?;
        let transformer = PayloadTransformer::new(
            client,
            config.compression.aggressiveness,
            events.clone(),
        );
        let forwarder = UpstreamForwarder::new(&config.upstream, &config.outbound)?;

        let state = AppState {
            transformer: Arc::new(transformer),
            forwarder: Arc::new(forwarder),
            stats: stats.clone(),
            events,
        };

        let router = Self::build_router(config, state);
        Ok(Self { router, stats })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &ProxyConfig, state: AppState) -> Router {
        Router::new()
            .route("/{*path}", any(proxy_handler))
            .route("/", any(proxy_handler))
            .with_state(state)
            .layer(DefaultBodyLimit::max(config.security.max_body_size))
            .layer(TraceLayer::new_for_http())
    }

    /// Router clone, for driving the front end without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Lifetime counters shared with every request.
    pub fn stats(&self) -> Arc<LifetimeStats> {
        self.stats.clone()
    }

    /// Run the server until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Main proxy handler.
/// Buffers the body, compresses eligible payloads, and forwards upstream.
async fn proxy_handler(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    state.stats.record_request();

    let request_id = Uuid::new_v4().to_string();
    let span = tracing::info_span!("request", request_id = %request_id);

    handle(state, request_id, method, uri, headers, body)
        .instrument(span)
        .await
}

async fn handle(
    state: AppState,
    request_id: String,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let path = uri.path();
    let path_and_query = uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");
    let eligible = is_eligible(&method, path);

    let body = match body {
        Ok(body) => body,
        Err(rejection) => {
            tracing::warn!(error = %rejection, "Failed to read request body");
            return rejection.into_response();
        }
    };

    state.events.record(ProxyEvent::RequestReceived {
        request_id: &request_id,
        method: method.as_str(),
        path: path_and_query,
        eligible,
    });

    let body = if eligible && !body.is_empty() {
        let transformed = state.transformer.transform(&request_id, body).await;
        state
            .stats
            .record_savings(transformed.tokens_saved, transformed.original_tokens);
        transformed.body
    } else {
        body
    };

    match state
        .forwarder
        .forward(method, path_and_query, headers, body)
        .await
    {
        Ok(response) => response,
        Err(error) => {
            state.events.record(ProxyEvent::ForwardFailed {
                request_id: &request_id,
                error: &error,
            });
            metrics::record_upstream_failure();
            error.into_response()
        }
    }
}
