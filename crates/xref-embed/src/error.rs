//! Embedding errors.

use thiserror::Error;

use crate::config::ConfigError;

/// Errors raised while producing an embedding.
///
/// Only [`EmbeddingError::EmptyInput`] and configuration errors reach
/// callers of [`crate::EmbeddingGenerator::generate`]; encoder failures are
/// absorbed into the degraded fallback.
#[derive(Error, Debug)]
pub enum EmbeddingError {
    /// The input text is empty or whitespace only.
    #[error("embedding input is empty after trimming")]
    EmptyInput,

    /// The encoder could not be reached or refused the request.
    #[error("encoder unavailable: {reason}")]
    EncoderUnavailable {
        /// Transport or service diagnostic.
        reason: String,
    },

    /// The encoder answered with output that cannot be pooled.
    #[error("malformed encoder output: {reason}")]
    MalformedOutput {
        /// What was wrong with the output.
        reason: String,
    },

    /// The pooled vector does not have the configured dimension.
    #[error("encoder dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Configured dimensionality.
        expected: usize,
        /// Dimensionality produced by the encoder.
        actual: usize,
    },

    /// Encoder configuration is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),
}
