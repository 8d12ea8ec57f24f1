//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Startup
//!     → listener.rs (bind loopback address, fatal on failure)
//!     → Hand off to HTTP layer
//!
//! Outbound calls
//!     → client.rs (shared reqwest settings: connect timeout, proxy policy)
//! ```
//!
//! # Design Decisions
//! - The inbound side is plain HTTP on loopback; TLS only happens outbound
//! - A bind failure stops the process

pub mod client;
pub mod listener;
