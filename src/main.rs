//! prompt-squeeze: a local compressing proxy for chat-completion APIs.
//!
//! # Architecture Overview
//!
//! ```text
//!                         ┌──────────────────────────────────────────────┐
//!                         │                 PROMPT SQUEEZE               │
//!   API client            │  ┌──────────┐   ┌──────────┐   ┌──────────┐  │
//!   ──────────────────────┼─▶│ listener │──▶│  http    │──▶│ payload  │  │
//!   (127.0.0.1:8877)      │  │ loopback │   │ front end│   │transform │  │
//!                         │  └──────────┘   └────┬─────┘   └────┬─────┘  │
//!                         │                      │              │ per block
//!                         │                      │              ▼        │      compression
//!                         │                      │        ┌───────────┐  │      service
//!                         │                      │        │compression│──┼────▶ (TLS)
//!                         │                      │        │  client   │  │
//!                         │                      ▼        └───────────┘  │
//!   ◀─────────────────────┼──────────────── ┌──────────┐                 │      real API
//!   streamed response     │                 │ upstream │─────────────────┼────▶ (TLS)
//!                         │                 │forwarder │                 │
//!                         │                 └──────────┘                 │
//!                         └──────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;

use prompt_squeeze::config::{self, loader, ProxyConfig};
use prompt_squeeze::http::HttpServer;
use prompt_squeeze::lifecycle::Shutdown;
use prompt_squeeze::net::listener;
use prompt_squeeze::observability::{self, LifetimeStats, StatsReporter, TracingSink};

#[derive(Parser)]
#[command(name = "prompt-squeeze")]
#[command(about = "Local proxy that compresses chat-completion requests before forwarding them", long_about = None)]
struct Cli {
    /// Optional TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listening port (overrides file and environment).
    #[arg(short, long)]
    port: Option<u16>,

    /// Log filter, e.g. "info" or "prompt_squeeze=debug".
    #[arg(long)]
    log_level: Option<String>,
}

fn load(cli: &Cli) -> Result<ProxyConfig, config::ConfigError> {
    let mut config = match &cli.config {
        Some(path) => config::load_config(path)?,
        None => ProxyConfig::default(),
    };

    config::apply_env_overrides(&mut config, |name| std::env::var(name).ok())?;

    if let Some(port) = cli.port {
        loader::set_port(&mut config, port);
    }
    if let Some(level) = &cli.log_level {
        config.observability.log_level = level.clone();
    }

    config::validate_config(&config).map_err(config::ConfigError::Validation)?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load(&cli)?;

    observability::logging::init(&config.observability)?;

    tracing::info!("prompt-squeeze v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        upstream = %config.upstream.base_url,
        aggressiveness = config.compression.aggressiveness,
        min_text_length = config.compression.min_text_length,
        "Configuration loaded"
    );

    if !config.compression.enabled() {
        tracing::warn!("TTC_KEY not set - compression disabled, acting as passthrough proxy");
    }

    let stats = Arc::new(LifetimeStats::new());
    let server = HttpServer::with_parts(&config, Arc::new(TracingSink), stats.clone())?;

    // Bind last: traffic only once everything is ready.
    let listener = listener::bind(&config.listener).await?;
    let local_addr = listener.local_addr()?;
    tracing::info!("To use: ANTHROPIC_BASE_URL=http://{} claude", local_addr);

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => observability::metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let shutdown = Shutdown::new();
    shutdown.trigger_on_signal();

    let reporter = StatsReporter::new(
        stats.clone(),
        Duration::from_secs(config.observability.stats_interval_secs),
    );
    tokio::spawn(reporter.run(shutdown.subscribe()));

    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!(stats = %stats.snapshot(), "Shutdown complete");
    Ok(())
}
