//! Lifetime savings counters and periodic summaries.
//!
//! # Responsibilities
//! - Count every inbound request exactly once
//! - Accumulate token savings across concurrent requests
//! - Render the one-line savings summary
//! - Emit the summary on an interval until shutdown
//!
//! # Design Decisions
//! - Plain atomics; requests never wait on each other to update totals
//! - Counters are injected into the front end, never reached through a global

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::broadcast;
use tokio::time;

use crate::observability::metrics;

/// Totals shared by every in-flight request.
#[derive(Debug)]
pub struct LifetimeStats {
    requests: AtomicU64,
    compressed_requests: AtomicU64,
    tokens_saved: AtomicU64,
    original_tokens: AtomicU64,
    started: Instant,
}

impl LifetimeStats {
    pub fn new() -> Self {
        Self {
            requests: AtomicU64::new(0),
            compressed_requests: AtomicU64::new(0),
            tokens_saved: AtomicU64::new(0),
            original_tokens: AtomicU64::new(0),
            started: Instant::now(),
        }
    }

    /// Count one inbound request.
    pub fn record_request(&self) {
        self.requests.fetch_add(1, Ordering::Relaxed);
        metrics::record_request();
    }

    /// Add the totals of one transformed request.
    pub fn record_savings(&self, tokens_saved: u64, original_tokens: u64) {
        saturating_add(&self.tokens_saved, tokens_saved);
        saturating_add(&self.original_tokens, original_tokens);
        if tokens_saved > 0 {
            self.compressed_requests.fetch_add(1, Ordering::Relaxed);
        }
        metrics::record_savings(tokens_saved, original_tokens);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            requests: self.requests.load(Ordering::Relaxed),
            compressed_requests: self.compressed_requests.load(Ordering::Relaxed),
            tokens_saved: self.tokens_saved.load(Ordering::Relaxed),
            original_tokens: self.original_tokens.load(Ordering::Relaxed),
            uptime: self.started.elapsed(),
        }
    }
}

/// Add `value` to `counter`, sticking at `u64::MAX` instead of wrapping.
fn saturating_add(counter: &AtomicU64, value: u64) {
    // The closure always returns Some, so the update cannot fail.
    let _ = counter.fetch_update(Ordering::Relaxed, Ordering::Relaxed, |current| {
        Some(current.saturating_add(value))
    });
}

impl Default for LifetimeStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-in-time copy of [`LifetimeStats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub requests: u64,
    pub compressed_requests: u64,
    pub tokens_saved: u64,
    pub original_tokens: u64,
    pub uptime: Duration,
}

impl StatsSnapshot {
    /// Rounded share of original tokens that were saved.
    pub fn savings_percent(&self) -> u64 {
        if self.original_tokens == 0 {
            return 0;
        }
        (self.tokens_saved as f64 / self.original_tokens as f64 * 100.0).round() as u64
    }
}

impl fmt::Display for StatsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} requests, {} compressed, {} tokens saved ({}% reduction), uptime {}s",
            self.requests,
            self.compressed_requests,
            self.tokens_saved,
            self.savings_percent(),
            self.uptime.as_secs()
        )
    }
}

/// Logs the lifetime summary on a fixed interval.
pub struct StatsReporter {
    stats: Arc<LifetimeStats>,
    interval: Duration,
}

impl StatsReporter {
    pub fn new(stats: Arc<LifetimeStats>, interval: Duration) -> Self {
        Self { stats, interval }
    }

    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        if self.interval.is_zero() {
            tracing::debug!("Periodic stats disabled");
            return;
        }

        let mut ticker = time::interval(self.interval);
        // The first tick completes immediately.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    tracing::info!(stats = %self.stats.snapshot(), "Stats");
                }
                _ = shutdown.recv() => {
                    tracing::debug!("Stats reporter received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }
}
