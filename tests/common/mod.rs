//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::future::Future;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::body::{Body, Bytes};
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::response::Response;
use axum::routing::post;
use axum::{Json, Router};
use serde_json::Value;
use tokio::net::TcpListener;

use prompt_squeeze::config::ProxyConfig;
use prompt_squeeze::http::HttpServer;
use prompt_squeeze::lifecycle::Shutdown;
use prompt_squeeze::observability::{LifetimeStats, NoopSink};

/// A request as seen by the mock upstream.
#[derive(Debug, Clone)]
pub struct Captured {
    pub method: Method,
    pub uri: Uri,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl Captured {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).expect("upstream body is JSON")
    }
}

/// Mock upstream API that records every request it receives.
pub struct MockUpstream {
    pub addr: SocketAddr,
    pub captured: Arc<Mutex<Vec<Captured>>>,
}

impl MockUpstream {
    pub fn requests(&self) -> Vec<Captured> {
        self.captured.lock().unwrap().clone()
    }
}

async fn serve(router: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
    addr
}

/// Start an upstream that answers every request with `status` and `body`.
pub async fn start_upstream(status: u16, body: &'static str) -> MockUpstream {
    let captured = Arc::new(Mutex::new(Vec::new()));
    let log = captured.clone();

    let router = Router::new().fallback(
        move |method: Method, uri: Uri, headers: HeaderMap, body_bytes: Bytes| {
            let log = log.clone();
            async move {
                log.lock().unwrap().push(Captured {
                    method,
                    uri,
                    headers,
                    body: body_bytes,
                });
                Response::builder()
                    .status(StatusCode::from_u16(status).unwrap())
                    .header("content-type", "application/json")
                    .header("x-upstream", "mock")
                    .header("request-id", "req_123")
                    .body(Body::from(body))
                    .unwrap()
            }
        },
    );

    MockUpstream {
        addr: serve(router).await,
        captured,
    }
}

/// Start an upstream whose handler is fully programmable.
pub async fn start_programmable_upstream(router: Router) -> SocketAddr {
    serve(router).await
}

/// Start a programmable compression service.
///
/// `f` receives the `input` text and returns the JSON response body.
pub async fn start_compressor<F, Fut>(f: F) -> SocketAddr
where
    F: Fn(String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Value> + Send + 'static,
{
    let f = Arc::new(f);
    let router = Router::new().route(
        "/v1/compress",
        post(move |headers: HeaderMap, Json(body): Json<Value>| {
            let f = f.clone();
            async move {
                assert_eq!(
                    headers.get("authorization").and_then(|v| v.to_str().ok()),
                    Some("Bearer test-key")
                );
                assert_eq!(body["model"], "bear-1");
                let input = body["input"].as_str().unwrap_or_default().to_string();
                Json(f(input).await)
            }
        }),
    );
    serve(router).await
}

/// An address nothing is listening on.
pub async fn closed_port() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

/// Proxy configuration pointing at the mocks.
pub fn proxy_config(upstream: SocketAddr, compressor: Option<SocketAddr>) -> ProxyConfig {
    let mut config = ProxyConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();
    config.upstream.base_url = format!("http://{}", upstream);
    config.outbound.use_system_proxy = false;
    if let Some(addr) = compressor {
        config.compression.api_key = Some("test-key".into());
        config.compression.endpoint = format!("http://{}/v1/compress", addr);
    }
    config
}

/// A running proxy.
pub struct RunningProxy {
    pub addr: SocketAddr,
    pub stats: Arc<LifetimeStats>,
    pub shutdown: Shutdown,
}

impl RunningProxy {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

impl Drop for RunningProxy {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

pub async fn start_proxy(config: ProxyConfig) -> RunningProxy {
    let server = HttpServer::with_events(&config, Arc::new(NoopSink)).unwrap();
    let stats = server.stats();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    RunningProxy {
        addr,
        stats,
        shutdown,
    }
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}

pub fn messages_body(content: &str) -> Value {
    serde_json::json!({
        "model": "claude-sonnet-4-5",
        "max_tokens": 1024,
        "messages": [ { "role": "user", "content": content } ]
    })
}
