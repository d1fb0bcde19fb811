//! # Encoder Seam
//!
//! An [`Encoder`] turns text into per-token hidden states plus the
//! attention mask that marks which positions are real tokens. Pooling and
//! normalization happen in [`crate::EmbeddingGenerator`], so encoders stay
//! thin adapters over whatever model backend is deployed.
//!
//! The trait is synchronous and object-safe. Batch indexing runs on a
//! blocking worker, so a slow encoder call never stalls the async runtime.

use crate::error::EmbeddingError;
use crate::fallback::expand_digest;
use crate::{DEFAULT_DIMENSION, DEFAULT_MAX_TOKENS};

/// Per-token encoder output.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenStates {
    /// One hidden-state row per token position.
    pub hidden: Vec<Vec<f32>>,
    /// 1 for real tokens, 0 for padding. Same length as `hidden`.
    pub attention_mask: Vec<u32>,
}

/// A text encoder producing token-level hidden states.
pub trait Encoder: Send + Sync {
    /// Model identifier recorded alongside every embedding.
    fn model_id(&self) -> &str;

    /// Hidden-state width.
    fn dimension(&self) -> usize;

    /// Truncation length in tokens.
    fn max_tokens(&self) -> usize;

    /// Encode `text`, truncating to [`Encoder::max_tokens`].
    fn encode(&self, text: &str) -> Result<TokenStates, EmbeddingError>;
}

// ─── Hashing encoder ─────────────────────────────────────────────────

/// Offline hashed bag-of-words encoder.
///
/// Each lowercased alphanumeric word maps to a fixed pseudo-random
/// direction, so after mean pooling two texts are similar in proportion to
/// their shared vocabulary. Sequences are padded to a multiple of 8 with
/// masked positions, the way batched transformer inputs are.
#[derive(Debug, Clone)]
pub struct HashingEncoder {
    dimension: usize,
    max_tokens: usize,
}

impl HashingEncoder {
    /// Model identifier written to embedding records.
    pub const MODEL_ID: &'static str = "xref-hashing-bow-v1";

    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}

impl Default for HashingEncoder {
    fn default() -> Self {
        Self::new(DEFAULT_DIMENSION)
    }
}

impl Encoder for HashingEncoder {
    fn model_id(&self) -> &str {
        Self::MODEL_ID
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn max_tokens(&self) -> usize {
        self.max_tokens
    }

    fn encode(&self, text: &str) -> Result<TokenStates, EmbeddingError> {
        let mut hidden: Vec<Vec<f32>> = text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .take(self.max_tokens)
            .map(|w| expand_digest(w.to_lowercase().as_bytes(), self.dimension))
            .collect();
        if hidden.is_empty() {
            return Err(EmbeddingError::MalformedOutput {
                reason: "text contains no tokens".into(),
            });
        }

        let real = hidden.len();
        let padded = real.div_ceil(8) * 8;
        let mut attention_mask = vec![1u32; real];
        while hidden.len() < padded {
            hidden.push(vec![1.0; self.dimension]);
            attention_mask.push(0);
        }
        Ok(TokenStates {
            hidden,
            attention_mask,
        })
    }
}

// ─── Unavailable encoder ─────────────────────────────────────────────

/// An encoder that always fails. Drives the degraded fallback.
#[derive(Debug, Clone)]
pub struct UnavailableEncoder {
    dimension: usize,
}

impl UnavailableEncoder {
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }
}

impl Encoder for UnavailableEncoder {
    fn model_id(&self) -> &str {
        "unavailable"
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn max_tokens(&self) -> usize {
        DEFAULT_MAX_TOKENS
    }

    fn encode(&self, _text: &str) -> Result<TokenStates, EmbeddingError> {
        Err(EmbeddingError::EncoderUnavailable {
            reason: "no encoder backend".into(),
        })
    }
}
