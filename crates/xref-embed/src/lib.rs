//! # xref-embed — Requirement Embedding Generation
//!
//! Converts normalized requirement text into fixed-dimension, unit-length
//! vectors.
//!
//! ## Pipeline
//!
//! 1. Reject blank input ([`EmbeddingError::EmptyInput`]).
//! 2. Detect the source language with a keyword-frequency heuristic and
//!    expand that language's compliance abbreviations.
//! 3. Run the text through an [`Encoder`], truncated at `max_tokens`.
//! 4. Mean-pool token states weighted by the attention mask, then
//!    L2-normalize.
//!
//! ## Degraded Mode
//!
//! Any encoder failure falls back to a deterministic SHA-256 pseudo-vector
//! of the configured dimension. The result is returned as
//! [`GeneratedVector::Degraded`] and the process-wide degraded flag is
//! raised ([`degraded_mode`]). Degraded vectors carry no semantic meaning:
//! callers must not treat their similarities as genuine matches.
//!
//! ## Encoders
//!
//! - [`HttpEncoder`]: text-embeddings-inference style `/embed_all` endpoint,
//!   configured by [`EncoderConfig::from_env`].
//! - [`HashingEncoder`]: offline hashed bag-of-words encoder, used when no
//!   endpoint is configured and in tests.
//! - [`UnavailableEncoder`]: always fails, exercising the degraded path.

pub mod config;
pub mod encoder;
pub mod error;
pub mod fallback;
pub mod generator;
pub mod http;
pub mod language;
pub mod pooling;

pub use config::{ConfigError, EncoderConfig};
pub use encoder::{Encoder, HashingEncoder, TokenStates, UnavailableEncoder};
pub use error::EmbeddingError;
pub use fallback::{clear_degraded_mode, degraded_mode, hash_embedding};
pub use generator::{EmbeddingGenerator, GeneratedVector};
pub use http::HttpEncoder;
pub use language::{detect_language, expand_abbreviations, Language};
pub use pooling::{cosine_similarity, l2_normalize, mean_pool};

/// Default embedding dimensionality (`xlm-roberta-base` hidden size).
pub const DEFAULT_DIMENSION: usize = 768;

/// Default truncation length in tokens.
pub const DEFAULT_MAX_TOKENS: usize = 512;
