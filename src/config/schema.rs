//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the proxy.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root configuration for the compressing proxy.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ProxyConfig {
    /// Inbound listener (loopback only).
    pub listener: ListenerConfig,

    /// Compression service settings.
    pub compression: CompressionConfig,

    /// Real chat-completion API the proxy forwards to.
    pub upstream: UpstreamConfig,

    /// Settings shared by every outbound client.
    pub outbound: OutboundConfig,

    /// Inbound request limits.
    pub security: SecurityConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "127.0.0.1:8877"). Must be a loopback address.
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:8877".to_string(),
        }
    }
}

/// Compression service configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CompressionConfig {
    /// Bearer credential. Compression is disabled when absent.
    pub api_key: Option<String>,

    /// Compression endpoint URL.
    pub endpoint: String,

    /// Model identifier sent with every compression call.
    pub model: String,

    /// How strongly the service rewrites text (0.0 - 1.0).
    pub aggressiveness: f64,

    /// Texts shorter than this (in characters) are never sent.
    pub min_text_length: usize,

    /// Hard deadline for one compression call in seconds.
    pub timeout_secs: u64,
}

impl CompressionConfig {
    /// True when a credential is configured.
    pub fn enabled(&self) -> bool {
        self.api_key.as_deref().is_some_and(|key| !key.is_empty())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for CompressionConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            endpoint: "https://api.thetokencompany.com/v1/compress".to_string(),
            model: "bear-1".to_string(),
            aggressiveness: 0.6,
            min_text_length: 150,
            timeout_secs: 30,
        }
    }
}

/// Upstream API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Scheme and authority of the real API (e.g., "https://api.anthropic.com").
    pub base_url: String,

    /// Maximum idle time between two reads of the upstream response, in seconds.
    pub read_timeout_secs: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.anthropic.com".to_string(),
            read_timeout_secs: 300,
        }
    }
}

/// Outbound client configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct OutboundConfig {
    /// Connection establishment timeout in seconds.
    pub connect_timeout_secs: u64,

    /// Honor HTTP(S)_PROXY environment variables for outbound calls.
    pub use_system_proxy: bool,
}

impl Default for OutboundConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: 10,
            use_system_proxy: true,
        }
    }
}

/// Inbound request limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Maximum buffered request body size in bytes.
    pub max_body_size: usize,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            max_body_size: 32 * 1024 * 1024, // 32MB
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error) or a full filter directive.
    pub log_level: String,

    /// Append log lines to this file in addition to stdout.
    pub log_file: Option<String>,

    /// Interval between savings summaries in seconds (0 disables them).
    pub stats_interval_secs: u64,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_file: None,
            stats_interval_secs: 300,
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9877".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let config: ProxyConfig = toml::from_str("").unwrap();
        assert_eq!(config.listener.bind_address, "127.0.0.1:8877");
        assert_eq!(config.compression.min_text_length, 150);
        assert!((config.compression.aggressiveness - 0.6).abs() < f64::EPSILON);
        assert_eq!(config.compression.timeout_secs, 30);
        assert!(!config.compression.enabled());
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config: ProxyConfig = toml::from_str(
            r#"
            [compression]
            api_key = "ttc-123"
            aggressiveness = 0.9
            "#,
        )
        .unwrap();
        assert!(config.compression.enabled());
        assert_eq!(config.compression.model, "bear-1");
        assert_eq!(config.upstream.base_url, "https://api.anthropic.com");
    }

    #[test]
    fn empty_key_disables_compression() {
        let mut config = CompressionConfig::default();
        config.api_key = Some(String::new());
        assert!(!config.enabled());
    }
}
