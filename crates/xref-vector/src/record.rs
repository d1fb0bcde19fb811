//! Stored and returned record shapes.

use serde::{Deserialize, Serialize};
use xref_core::{RequirementId, Timestamp};

/// The embedding of one requirement. Upsert key: `requirement_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingRecord {
    pub requirement_id: RequirementId,
    /// Unit-length vector.
    pub vector: Vec<f32>,
    /// Normalized text the vector was generated from.
    pub source_text: String,
    /// Encoder model identifier, or `hash-fallback` for degraded vectors.
    pub model: String,
    /// Whether the vector came from the hash fallback.
    #[serde(default)]
    pub degraded: bool,
    /// Mirrors the requirement's `is_active` for `active_only` queries.
    #[serde(default = "default_true")]
    pub active: bool,
    /// The requirement's catalog sequence. Breaks distance ties.
    #[serde(default)]
    pub sequence: u64,
    pub updated_at: Timestamp,
}

impl EmbeddingRecord {
    /// Model identifier recorded for hash-fallback vectors.
    pub const FALLBACK_MODEL: &'static str = "hash-fallback";

    pub fn new(
        requirement_id: RequirementId,
        vector: Vec<f32>,
        source_text: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            requirement_id,
            vector,
            source_text: source_text.into(),
            model: model.into(),
            degraded: false,
            active: true,
            sequence: 0,
            updated_at: Timestamp::now(),
        }
    }

    /// A record for a hash-fallback vector.
    pub fn degraded(
        requirement_id: RequirementId,
        vector: Vec<f32>,
        source_text: impl Into<String>,
    ) -> Self {
        Self {
            degraded: true,
            ..Self::new(requirement_id, vector, source_text, Self::FALLBACK_MODEL)
        }
    }

    pub fn with_sequence(mut self, sequence: u64) -> Self {
        self.sequence = sequence;
        self
    }
}

/// One nearest-neighbour hit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Neighbor {
    pub requirement_id: RequirementId,
    /// Euclidean (L2) distance between unit vectors, in `[0, 2]`.
    pub distance: f32,
}

impl Neighbor {
    pub fn similarity(&self) -> f64 {
        similarity(self.distance)
    }
}

/// Convert an L2 distance into a similarity in `[0, 1]`.
///
/// Non-finite distances map to 0.0.
pub fn similarity(distance: f32) -> f64 {
    let s = 1.0 - f64::from(distance);
    if s.is_nan() {
        0.0
    } else {
        s.clamp(0.0, 1.0)
    }
}

/// How a candidate match was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchSource {
    /// Nearest-neighbour search over embeddings.
    Semantic,
    /// Substring fallback while the index is unavailable. Similarity is
    /// always 0.0.
    Keyword,
}

/// A candidate requirement for mapping, tagged with how it was found.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RequirementMatch {
    pub requirement_id: RequirementId,
    pub similarity: f64,
    pub source: MatchSource,
}

impl From<Neighbor> for RequirementMatch {
    fn from(n: Neighbor) -> Self {
        Self {
            requirement_id: n.requirement_id,
            similarity: n.similarity(),
            source: MatchSource::Semantic,
        }
    }
}

fn default_true() -> bool {
    true
}
