//! Text compression subsystem.
//!
//! # Data Flow
//! ```text
//! text unit from the payload transformer
//!     → client.rs (skip checks: credential, empty, length)
//!     → POST to the compression endpoint (bounded by timeout)
//!     → types.rs (accept only if output_tokens < original_input_tokens)
//!     → CompressionResult (compressed text, or the original on any fallback)
//! ```

pub mod client;
pub mod types;

pub use client::CompressionClient;
pub use types::{CompressionError, CompressionResult, Outcome, SkipReason};
