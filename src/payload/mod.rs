//! Chat payload subsystem.
//!
//! # Data Flow
//! ```text
//! buffered request body (eligible request)
//!     → message.rs (decode, locate text units in user/assistant messages)
//!     → transformer.rs (compress units concurrently, write back by slot)
//!     → re-encoded body + savings totals
//! ```

pub mod message;
pub mod transformer;

use thiserror::Error;

pub use message::{ChatPayload, ContentBlock, MessageContent, Role, TextSlot, TextUnit};
pub use transformer::{PayloadTransformer, Transformed};

/// Why a payload was forwarded without transformation.
#[derive(Debug, Error)]
pub enum TransformError {
    #[error("failed to decode payload: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("failed to encode payload: {0}")]
    Encode(#[source] serde_json::Error),
}
