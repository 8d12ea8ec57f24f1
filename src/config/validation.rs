//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, aggressiveness within 0..=1)
//! - Keep the listener on loopback
//! - Check outbound URLs are usable
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProxyConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;
use url::Url;

use crate::config::schema::ProxyConfig;

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("listener.bind_address '{0}' is not a socket address")]
    InvalidBindAddress(String),

    #[error("listener.bind_address '{0}' is not a loopback address")]
    NonLoopbackBind(String),

    #[error("compression.aggressiveness {0} is outside 0.0..=1.0")]
    AggressivenessOutOfRange(f64),

    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },

    #[error("{field} '{value}' is not a valid http(s) URL")]
    InvalidUrl { field: &'static str, value: String },
}

/// Check every semantic rule, collecting all failures.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    match config.listener.bind_address.parse::<SocketAddr>() {
        Ok(addr) if !addr.ip().is_loopback() => {
            errors.push(ValidationError::NonLoopbackBind(config.listener.bind_address.clone()));
        }
        Ok(_) => {}
        Err(_) => {
            errors.push(ValidationError::InvalidBindAddress(config.listener.bind_address.clone()));
        }
    }

    let aggressiveness = config.compression.aggressiveness;
    if !(0.0..=1.0).contains(&aggressiveness) {
        errors.push(ValidationError::AggressivenessOutOfRange(aggressiveness));
    }

    let positive = [
        ("compression.timeout_secs", config.compression.timeout_secs),
        ("upstream.read_timeout_secs", config.upstream.read_timeout_secs),
        ("outbound.connect_timeout_secs", config.outbound.connect_timeout_secs),
        ("security.max_body_size", config.security.max_body_size as u64),
    ];
    for (field, value) in positive {
        if value == 0 {
            errors.push(ValidationError::Zero { field });
        }
    }

    check_url("upstream.base_url", &config.upstream.base_url, &mut errors);
    check_url("compression.endpoint", &config.compression.endpoint, &mut errors);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_url(field: &'static str, value: &str, errors: &mut Vec<ValidationError>) {
    let usable = Url::parse(value)
        .map(|url| matches!(url.scheme(), "http" | "https") && url.host_str().is_some())
        .unwrap_or(false);
    if !usable {
        errors.push(ValidationError::InvalidUrl {
            field,
            value: value.to_string(),
        });
    }
}
