//! Payload transformation.
//!
//! # Responsibilities
//! - Decode an eligible request body
//! - Compress every eligible text unit concurrently
//! - Write results back into their own slots and re-encode
//! - Sum savings for the request
//!
//! # Design Decisions
//! - A body that cannot be decoded or re-encoded is forwarded untouched
//! - When nothing was rewritten the original bytes are returned as-is
//! - Results are applied in slot order, so completion order never matters

use std::sync::Arc;

use axum::body::Bytes;
use futures_util::future::join_all;

use crate::compression::CompressionClient;
use crate::observability::{EventSink, ProxyEvent};
use crate::payload::message::{ChatPayload, TextSlot};

/// Body produced by [`PayloadTransformer::transform`] plus its savings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transformed {
    pub body: Bytes,
    pub tokens_saved: u64,
    pub original_tokens: u64,
    /// Text units sent through the compression client.
    pub blocks: usize,
}

impl Transformed {
    fn untouched(body: Bytes) -> Self {
        Self {
            body,
            tokens_saved: 0,
            original_tokens: 0,
            blocks: 0,
        }
    }
}

/// Rewrites chat payloads through the compression client.
pub struct PayloadTransformer {
    client: CompressionClient,
    aggressiveness: f64,
    events: Arc<dyn EventSink>,
}

impl PayloadTransformer {
    pub fn new(client: CompressionClient, aggressiveness: f64, events: Arc<dyn EventSink>) -> Self {
        Self {
            client,
            aggressiveness,
            events,
        }
    }

    /// Transform `raw`. Never fails: any problem yields `raw` with zero totals.
    pub async fn transform(&self, request_id: &str, raw: Bytes) -> Transformed {
        let mut payload = match ChatPayload::decode(&raw) {
            Ok(payload) => payload,
            Err(error) => {
                self.events.record(ProxyEvent::TransformFailed {
                    request_id,
                    error: &error,
                });
                return Transformed::untouched(raw);
            }
        };

        let Some(messages) = payload.messages() else {
            return Transformed::untouched(raw);
        };
        tracing::debug!(request_id, messages = messages.len(), "Processing messages");

        let units = payload.text_units(self.client.min_text_length());
        if units.is_empty() {
            return Transformed::untouched(raw);
        }

        let slots: Vec<TextSlot> = units.iter().map(|unit| unit.slot).collect();
        let results = join_all(
            units
                .iter()
                .map(|unit| self.client.compress(unit.text, self.aggressiveness)),
        )
        .await;

        let mut tokens_saved: u64 = 0;
        let mut original_tokens: u64 = 0;
        let mut rewritten = 0;

        for (slot, result) in slots.iter().copied().zip(results) {
            self.events.record(ProxyEvent::BlockOutcome {
                request_id,
                slot,
                outcome: &result.outcome,
            });
            if !result.is_compressed() {
                continue;
            }
            // Counts come from the service; clamp rather than overflow.
            tokens_saved = tokens_saved.saturating_add(result.tokens_saved);
            original_tokens = original_tokens.saturating_add(result.original_tokens);
            if payload.replace(slot, result.text) {
                rewritten += 1;
            }
        }

        self.events.record(ProxyEvent::RequestSummary {
            request_id,
            blocks: slots.len(),
            tokens_saved,
            original_tokens,
        });

        if rewritten == 0 {
            return Transformed {
                blocks: slots.len(),
                ..Transformed::untouched(raw)
            };
        }

        match payload.encode() {
            Ok(body) => Transformed {
                body: Bytes::from(body),
                tokens_saved,
                original_tokens,
                blocks: slots.len(),
            },
            Err(error) => {
                self.events.record(ProxyEvent::TransformFailed {
                    request_id,
                    error: &error,
                });
                Transformed::untouched(raw)
            }
        }
    }
}

impl std::fmt::Debug for PayloadTransformer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PayloadTransformer")
            .field("client", &self.client)
            .field("aggressiveness", &self.aggressiveness)
            .finish_non_exhaustive()
    }
}
