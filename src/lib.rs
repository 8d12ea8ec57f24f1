//! Compressing reverse proxy for chat-completion APIs.
//!
//! Sits on loopback between an API client and the real API, shrinks long
//! message text through a compression service, and relays the upstream
//! response untouched.

pub mod compression;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod payload;
pub mod upstream;

pub use config::schema::ProxyConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
