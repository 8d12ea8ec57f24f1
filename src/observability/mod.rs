//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Pipeline components produce:
//!     → events.rs (ProxyEvent via the injected EventSink)
//!     → stats.rs (lifetime counters, updated by the front end)
//!     → metrics.rs (optional Prometheus counters)
//!
//! Consumers:
//!     → logging.rs (stdout + optional log file)
//!     → StatsReporter (periodic one-line summaries)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Request ID flows through every event
//! - Counters are atomic; no request waits on another to report

pub mod events;
pub mod logging;
pub mod metrics;
pub mod stats;

pub use events::{EventSink, NoopSink, ProxyEvent, TracingSink};
pub use stats::{LifetimeStats, StatsReporter, StatsSnapshot};
