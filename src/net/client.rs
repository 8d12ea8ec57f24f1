//! Outbound HTTP client construction.

use std::time::Duration;

use crate::config::OutboundConfig;

/// Builder preloaded with the settings every outbound client shares.
pub fn client_builder(outbound: &OutboundConfig) -> reqwest::ClientBuilder {
    let builder = reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(outbound.connect_timeout_secs));

    if outbound.use_system_proxy {
        builder
    } else {
        builder.no_proxy()
    }
}
