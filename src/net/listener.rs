//! Loopback TCP listener.
//!
//! # Responsibilities
//! - Parse and bind the configured address
//! - Refuse anything that is not loopback
//! - Report bind failures as fatal errors

use std::net::SocketAddr;

use thiserror::Error;
use tokio::net::TcpListener;

use crate::config::ListenerConfig;

/// Error type for listener operations.
#[derive(Debug, Error)]
pub enum ListenerError {
    #[error("Invalid bind address '{0}'")]
    InvalidAddress(String),

    #[error("Refusing to bind non-loopback address {0}")]
    NotLoopback(SocketAddr),

    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },
}

/// Bind the inbound listener on a loopback address.
pub async fn bind(config: &ListenerConfig) -> Result<TcpListener, ListenerError> {
    let addr: SocketAddr = config
        .bind_address
        .parse()
        .map_err(|_| ListenerError::InvalidAddress(config.bind_address.clone()))?;

    if !addr.ip().is_loopback() {
        return Err(ListenerError::NotLoopback(addr));
    }

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| ListenerError::Bind { addr, source })?;

    if let Ok(local_addr) = listener.local_addr() {
        tracing::info!(address = %local_addr, "Listener bound");
    }

    Ok(listener)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(bind_address: &str) -> ListenerConfig {
        ListenerConfig {
            bind_address: bind_address.to_string(),
        }
    }

    #[tokio::test]
    async fn binds_ephemeral_loopback_port() {
        let listener = bind(&config("127.0.0.1:0")).await.unwrap();
        assert!(listener.local_addr().unwrap().ip().is_loopback());
    }

    #[tokio::test]
    async fn rejects_wildcard_address() {
        let err = bind(&config("0.0.0.0:0")).await.unwrap_err();
        assert!(matches!(err, ListenerError::NotLoopback(_)));
    }

    #[tokio::test]
    async fn port_in_use_is_an_error() {
        let first = bind(&config("127.0.0.1:0")).await.unwrap();
        let taken = first.local_addr().unwrap().to_string();
        let err = bind(&config(&taken)).await.unwrap_err();
        assert!(matches!(err, ListenerError::Bind { .. }));
    }
}
