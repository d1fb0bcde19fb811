//! # Error Types — Structured Error Hierarchy
//!
//! Errors shared across the `xref` workspace. Stage-specific errors
//! (embedding, vector store, validation workflow) live next to the stage
//! that raises them and are aggregated by the callers that need to.

use thiserror::Error;

/// Top-level error type for the foundational layer.
#[derive(Error, Debug)]
pub enum XrefError {
    /// A taxonomy value could not be parsed from its wire form.
    #[error("unknown {kind} value: {value:?}")]
    UnknownVariant {
        /// Which taxonomy was being parsed (e.g. "risk level").
        kind: &'static str,
        /// The rejected input.
        value: String,
    },

    /// An identifier could not be parsed.
    #[error("invalid identifier {value:?}: {reason}")]
    InvalidIdentifier {
        /// The rejected input.
        value: String,
        /// Parser diagnostic.
        reason: String,
    },

    /// A timestamp could not be parsed.
    #[error("invalid timestamp {value:?}: {reason}")]
    InvalidTimestamp {
        /// The rejected input.
        value: String,
        /// Parser diagnostic.
        reason: String,
    },

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
