//! # xref-vector — Requirement Vector Store
//!
//! Holds exactly one embedding per requirement and answers
//! nearest-neighbour queries over them. This is deliberately not a general
//! vector database: the only query shape is "top-k requirements closest to
//! this vector", optionally restricted to active requirements.
//!
//! ## Distance
//!
//! Vectors are unit length and compared by Euclidean (L2) distance
//! `d = |a - b|`, which ranges over `[0, 2]`. The similarity reported to
//! callers is `clamp(1 - d, 0, 1)`, see [`similarity`]. Two vectors at
//! cosine 0.9 are therefore only about 0.553 similar.
//!
//! ## Degraded Path
//!
//! When the index is unavailable every operation returns
//! [`VectorStoreError::Unavailable`]. Callers fall back to
//! [`keyword_matches`], whose results always carry similarity 0.0 and
//! [`MatchSource::Keyword`] so they can never pass a semantic threshold.

pub mod error;
pub mod keyword;
pub mod memory;
pub mod record;

pub use error::VectorStoreError;
pub use keyword::{keyword_matches, significant_terms};
pub use memory::MemoryVectorStore;
pub use record::{similarity, EmbeddingRecord, MatchSource, Neighbor, RequirementMatch};

use xref_core::RequirementId;

/// Storage contract for requirement embeddings.
///
/// Implementations must make each upsert atomic per requirement so that
/// concurrent readers observe either the old or the new vector, never a
/// mix.
pub trait VectorStore: Send + Sync {
    /// Insert or replace the embedding of `record.requirement_id`.
    ///
    /// Idempotent. Rejects vectors whose dimension differs from the vectors
    /// already stored.
    fn upsert(&self, record: EmbeddingRecord) -> Result<(), VectorStoreError>;

    /// Fetch the stored embedding of a requirement.
    fn get(&self, id: RequirementId) -> Result<Option<EmbeddingRecord>, VectorStoreError>;

    /// The `k` nearest embeddings to `query`, ascending by distance, ties
    /// broken by the requirements' catalog sequence and then their id.
    fn nearest(
        &self,
        query: &[f32],
        k: usize,
        active_only: bool,
    ) -> Result<Vec<Neighbor>, VectorStoreError>;

    /// Remove a requirement's embedding. Returns whether one existed.
    fn remove(&self, id: RequirementId) -> Result<bool, VectorStoreError>;

    /// Every requirement that currently has an embedding, in insertion
    /// order.
    fn requirement_ids(&self) -> Result<Vec<RequirementId>, VectorStoreError>;

    /// Mark a requirement active or inactive for `active_only` queries.
    fn set_active(&self, id: RequirementId, active: bool) -> Result<(), VectorStoreError>;

    /// Whether a requirement has an embedding.
    fn contains(&self, id: RequirementId) -> Result<bool, VectorStoreError> {
        Ok(self.get(id)?.is_some())
    }
}
