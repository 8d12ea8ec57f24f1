//! Configuration loading from disk and the environment.

use std::fs;
use std::net::{Ipv4Addr, SocketAddr};
use std::path::Path;

use thiserror::Error;

use crate::config::schema::ProxyConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Environment variable {name}='{value}' is invalid")]
    Env { name: &'static str, value: String },

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<ProxyConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config: ProxyConfig = toml::from_str(&content)?;

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Layer environment variables over an already loaded configuration.
///
/// `lookup` is usually `|name| std::env::var(name).ok()`.
pub fn apply_env_overrides<F>(config: &mut ProxyConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(value) = lookup("INTERCEPTOR_PORT") {
        let port = parse_env("INTERCEPTOR_PORT", &value)?;
        set_port(config, port);
    }

    if let Some(value) = lookup("TTC_KEY") {
        let key = value.trim().to_string();
        config.compression.api_key = (!key.is_empty()).then_some(key);
    }

    if let Some(value) = lookup("COMPRESSION_THRESHOLD") {
        config.compression.aggressiveness = parse_env("COMPRESSION_THRESHOLD", &value)?;
    }

    if let Some(value) = lookup("MIN_TEXT_LENGTH") {
        config.compression.min_text_length = parse_env("MIN_TEXT_LENGTH", &value)?;
    }

    if let Some(value) = lookup("LOG_FILE") {
        config.observability.log_file = (!value.is_empty()).then_some(value);
    }

    if let Some(value) = lookup("UPSTREAM_URL") {
        config.upstream.base_url = value;
    }

    Ok(())
}

/// Replace the listener port, keeping the configured loopback host.
pub fn set_port(config: &mut ProxyConfig, port: u16) {
    let mut addr = config
        .listener
        .bind_address
        .parse::<SocketAddr>()
        .unwrap_or_else(|_| SocketAddr::from((Ipv4Addr::LOCALHOST, port)));
    addr.set_port(port);
    config.listener.bind_address = addr.to_string();
}

fn parse_env<T: std::str::FromStr>(name: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::Env {
        name,
        value: value.to_string(),
    })
}
