//! # xref-engine — Cross-Framework Mapping Engine
//!
//! Finds requirements in different compliance frameworks that express the
//! same obligation, and manages the human review of what it finds.
//!
//! ## Stages
//!
//! - **Indexing** (`indexing.rs`): normalizes and embeds the requirements of
//!   a framework into the vector store, skipping those already embedded.
//!   Orphaned embeddings can be pruned.
//!
//! - **Detection** (`detector.rs`): nearest-neighbour search per
//!   requirement, classification into equivalent / similar / related,
//!   symmetric de-duplication, and merge into the mapping repository.
//!
//! - **Validation** (`validation.rs`): approve or reject mappings, list the
//!   pending queue, record curated mappings.
//!
//! - **Statistics** (`stats.rs`): counts, approval rate and per-requirement
//!   equivalence lookups.
//!
//! ## Batches
//!
//! Indexing and detection run through [`BatchRunner`]: a failing item is
//! logged and counted, never fatal, and staged writes are handed to a
//! [`Checkpoint`] every `checkpoint_every` items so that an interrupted run
//! keeps its progress.

pub mod batch;
pub mod catalog;
pub mod classify;
pub mod config;
pub mod dedupe;
pub mod detector;
pub mod error;
pub mod indexing;
pub mod repository;
pub mod stats;
pub mod validation;

pub use batch::{BatchRunner, BatchStats, Changeset, Checkpoint, CollectingCheckpoint, NoCheckpoint};
pub use catalog::{MemoryCatalog, RequirementCatalog};
pub use classify::{classify, initial_status};
pub use config::EngineConfig;
pub use dedupe::{dedupe_candidates, PairKey};
pub use detector::{DetectOptions, DetectionSummary, MappingDetector};
pub use error::{CheckpointError, ConfigError, EngineError, RepositoryError, ValidationStateError};
pub use indexing::{EmbeddingIndexer, EmbeddingOrigin, IndexSummary};
pub use repository::{MappingRepository, MemoryMappingRepository, MergeOutcome};
pub use stats::{Equivalence, MappingStatistics, StatusCounts, TypeCounts};
pub use validation::{
    apply_decision, PendingMapping, RequirementSummary, ValidationDecision, ValidationTransition,
    ValidationWorkflow,
};
