//! Engine errors.

use thiserror::Error;
use xref_core::{FrameworkId, MappingId, RequirementId};
use xref_embed::EmbeddingError;
use xref_vector::VectorStoreError;

/// Errors raised by the mapping engine.
///
/// Inside batch runs these are caught per item and counted; they only reach
/// callers from single-record operations.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("framework {0} not found")]
    FrameworkNotFound(FrameworkId),

    #[error("requirement {0} not found")]
    RequirementNotFound(RequirementId),

    #[error("requirements {source_id} and {target_id} belong to the same framework")]
    SameFramework {
        source_id: RequirementId,
        target_id: RequirementId,
    },

    #[error(transparent)]
    Embedding(#[from] EmbeddingError),

    #[error(transparent)]
    VectorStore(#[from] VectorStoreError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error(transparent)]
    Validation(#[from] ValidationStateError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Mapping repository failures.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RepositoryError {
    /// A mapping would join a requirement to itself.
    #[error("mapping joins requirement {0} to itself")]
    SelfMapping(RequirementId),

    /// The backing store rejected the write.
    #[error("mapping repository unavailable: {reason}")]
    Unavailable {
        /// Backend diagnostic.
        reason: String,
    },
}

/// Validation workflow failures.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationStateError {
    /// No mapping with this id exists.
    #[error("mapping {0} not found")]
    NotFound(MappingId),
}

/// Engine configuration failures.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid engine configuration: {0}")]
    Invalid(String),

    #[error("failed to read engine configuration {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse engine configuration: {0}")]
    Parse(#[from] serde_yaml::Error),
}

/// A checkpoint sink failed to make progress durable.
#[derive(Error, Debug)]
#[error("checkpoint failed: {reason}")]
pub struct CheckpointError {
    pub reason: String,
}
