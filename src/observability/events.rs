//! Pipeline event notifications.
//!
//! Components report what happened through an [`EventSink`] they were handed
//! at construction. The production sink turns events into structured
//! `tracing` records; tests use [`NoopSink`] or their own recorder.

use crate::compression::Outcome;
use crate::payload::{TextSlot, TransformError};
use crate::upstream::ForwardError;

/// Something worth reporting about a request in flight.
#[derive(Debug)]
pub enum ProxyEvent<'a> {
    /// An inbound request was accepted and its body buffered.
    RequestReceived {
        request_id: &'a str,
        method: &'a str,
        path: &'a str,
        eligible: bool,
    },
    /// One text unit went through the compression client.
    BlockOutcome {
        request_id: &'a str,
        slot: TextSlot,
        outcome: &'a Outcome,
    },
    /// The payload could not be decoded or re-encoded; it is forwarded untouched.
    TransformFailed {
        request_id: &'a str,
        error: &'a TransformError,
    },
    /// The upstream could not be reached or broke mid-request.
    ForwardFailed {
        request_id: &'a str,
        error: &'a ForwardError,
    },
    /// Savings for a transformed request.
    RequestSummary {
        request_id: &'a str,
        blocks: usize,
        tokens_saved: u64,
        original_tokens: u64,
    },
}

/// Fire-and-forget receiver of pipeline events.
pub trait EventSink: Send + Sync {
    fn record(&self, event: ProxyEvent<'_>);
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl EventSink for NoopSink {
    fn record(&self, _event: ProxyEvent<'_>) {}
}

/// Emits events as structured `tracing` records.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn record(&self, event: ProxyEvent<'_>) {
        match event {
            ProxyEvent::RequestReceived {
                request_id,
                method,
                path,
                eligible,
            } => {
                if eligible {
                    tracing::info!(request_id, method, path, "Message request received");
                } else {
                    tracing::debug!(request_id, method, path, "Passthrough request received");
                }
            }
            ProxyEvent::BlockOutcome {
                request_id,
                slot,
                outcome,
            } => match outcome {
                Outcome::Compressed {
                    original_tokens,
                    output_tokens,
                } => tracing::info!(
                    request_id,
                    slot = %slot,
                    original_tokens,
                    output_tokens,
                    saved = original_tokens - output_tokens,
                    "Block compressed"
                ),
                Outcome::Skipped(reason) => {
                    tracing::debug!(request_id, slot = %slot, reason = %reason, "Block skipped")
                }
                Outcome::NotImproved {
                    original_tokens,
                    output_tokens,
                } => tracing::debug!(
                    request_id,
                    slot = %slot,
                    original_tokens,
                    output_tokens,
                    "Compression did not shrink block; keeping original"
                ),
                Outcome::Failed(error) => tracing::warn!(
                    request_id,
                    slot = %slot,
                    error = %error,
                    "Compression failed; keeping original"
                ),
            },
            ProxyEvent::TransformFailed { request_id, error } => {
                tracing::error!(request_id, error = %error, "Payload processing error; forwarding original body")
            }
            ProxyEvent::ForwardFailed { request_id, error } => {
                tracing::error!(request_id, error = %error, "Forward error")
            }
            ProxyEvent::RequestSummary {
                request_id,
                blocks,
                tokens_saved,
                original_tokens,
            } => {
                if tokens_saved > 0 {
                    tracing::info!(request_id, blocks, tokens_saved, original_tokens, "Saved tokens this request");
                } else {
                    tracing::debug!(request_id, blocks, "No tokens saved this request");
                }
            }
        }
    }
}
