//! Compression results and the compression service wire format.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result of compressing one text unit.
///
/// `tokens_saved <= original_tokens` always holds. Any outcome other than
/// [`Outcome::Compressed`] carries the input text unchanged and zero totals.
#[derive(Debug)]
pub struct CompressionResult {
    pub text: String,
    pub tokens_saved: u64,
    pub original_tokens: u64,
    pub outcome: Outcome,
}

impl CompressionResult {
    /// Keep `text` as-is with zero savings.
    pub fn fallback(text: String, outcome: Outcome) -> Self {
        Self {
            text,
            tokens_saved: 0,
            original_tokens: 0,
            outcome,
        }
    }

    /// Accept a compressed text. Only constructed when `output_tokens < original_tokens`.
    fn compressed(text: String, original_tokens: u64, output_tokens: u64) -> Self {
        Self {
            text,
            tokens_saved: original_tokens - output_tokens,
            original_tokens,
            outcome: Outcome::Compressed {
                original_tokens,
                output_tokens,
            },
        }
    }

    /// Judge a service response against the text it was asked to shrink.
    pub fn from_response(input: &str, response: CompressResponse) -> Self {
        let output = response.output.unwrap_or_default();
        let original_tokens = response.original_input_tokens.unwrap_or(0);
        let output_tokens = response.output_tokens.unwrap_or(0);

        if output.is_empty() || output_tokens >= original_tokens {
            return Self::fallback(
                input.to_string(),
                Outcome::NotImproved {
                    original_tokens,
                    output_tokens,
                },
            );
        }

        Self::compressed(output, original_tokens, output_tokens)
    }

    pub fn is_compressed(&self) -> bool {
        matches!(self.outcome, Outcome::Compressed { .. })
    }
}

/// What happened to a text unit.
#[derive(Debug)]
pub enum Outcome {
    Compressed { original_tokens: u64, output_tokens: u64 },
    Skipped(SkipReason),
    /// The service answered but its output was not smaller.
    NotImproved { original_tokens: u64, output_tokens: u64 },
    Failed(CompressionError),
}

/// Why no call was made.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    Disabled,
    Empty,
    BelowThreshold { length: usize, min: usize },
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::Disabled => write!(f, "no compression credential"),
            SkipReason::Empty => write!(f, "empty text"),
            SkipReason::BelowThreshold { length, min } => {
                write!(f, "{} chars is below the {} char minimum", length, min)
            }
        }
    }
}

/// A compression call that went wrong. Never leaves the client as an error.
#[derive(Debug, Error)]
pub enum CompressionError {
    #[error("compression call timed out after {0}s")]
    Timeout(u64),

    #[error("transport error: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("compression service returned {0}")]
    Status(reqwest::StatusCode),

    #[error("malformed response: {0}")]
    Malformed(#[source] reqwest::Error),
}

/// Body of a compression call.
#[derive(Debug, Serialize)]
pub struct CompressRequest<'a> {
    pub model: &'a str,
    pub compression_settings: CompressionSettings,
    pub input: &'a str,
}

#[derive(Debug, Serialize)]
pub struct CompressionSettings {
    pub aggressiveness: f64,
}

/// Compression service response. Missing fields are treated as "no improvement".
#[derive(Debug, Default, Deserialize)]
pub struct CompressResponse {
    pub output: Option<String>,
    pub output_tokens: Option<u64>,
    pub original_input_tokens: Option<u64>,
}
