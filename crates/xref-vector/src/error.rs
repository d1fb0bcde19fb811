//! Vector store errors.

use thiserror::Error;

/// Errors raised by a [`crate::VectorStore`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum VectorStoreError {
    /// The index or its backing store cannot be reached.
    #[error("vector store unavailable: {reason}")]
    Unavailable {
        /// Diagnostic from the backend.
        reason: String,
    },

    /// A vector does not match the store's dimensionality.
    #[error("vector dimension mismatch: store holds {expected}, got {actual}")]
    DimensionMismatch {
        /// Dimension of the vectors already stored.
        expected: usize,
        /// Dimension of the rejected vector.
        actual: usize,
    },
}
