//! HTTP front end.
//!
//! # Data Flow
//! ```text
//! loopback TCP connection
//!     → server.rs (Axum, one task per connection)
//!     → buffer body, classify (POST + /messages)
//!     → payload transformer (eligible requests only)
//!     → upstream forwarder
//!     → status, headers and streamed body back to the caller
//! ```

pub mod server;

pub use server::{is_eligible, AppState, HttpServer, ServerError, MESSAGES_PATH_MARKER};
