//! # Batch Execution
//!
//! Framework-wide jobs (embedding indexing, mapping detection) process one
//! requirement at a time. Each item stages its writes into a
//! [`Changeset`] and applies them to the in-memory stores in one step, so
//! a failing item leaves nothing behind. Successful changesets are handed
//! to a [`Checkpoint`] every `checkpoint_every` items and once more at the
//! end, which is where a persistent backend makes progress durable.
//!
//! Item failures are logged and counted. They never abort the batch.

use serde::Serialize;
use xref_core::{Mapping, MappingId, RequirementId};
use xref_vector::EmbeddingRecord;

use crate::error::{CheckpointError, EngineError};

/// Writes produced by one or more batch items.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Changeset {
    pub embeddings: Vec<EmbeddingRecord>,
    pub removed_embeddings: Vec<RequirementId>,
    /// Inserted or updated mappings.
    pub mappings: Vec<Mapping>,
    pub removed_mappings: Vec<MappingId>,
}

impl Changeset {
    pub fn is_empty(&self) -> bool {
        self.embeddings.is_empty()
            && self.removed_embeddings.is_empty()
            && self.mappings.is_empty()
            && self.removed_mappings.is_empty()
    }

    /// Total number of staged writes.
    pub fn len(&self) -> usize {
        self.embeddings.len()
            + self.removed_embeddings.len()
            + self.mappings.len()
            + self.removed_mappings.len()
    }

    pub fn extend(&mut self, other: Changeset) {
        self.embeddings.extend(other.embeddings);
        self.removed_embeddings.extend(other.removed_embeddings);
        self.mappings.extend(other.mappings);
        self.removed_mappings.extend(other.removed_mappings);
    }
}

/// Durability sink for batch progress.
pub trait Checkpoint: Send {
    /// Persist `changes`. On error the changes are retried at the next
    /// checkpoint.
    fn commit(&mut self, changes: &Changeset) -> Result<(), CheckpointError>;
}

/// Checkpoint for purely in-memory runs.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoCheckpoint;

impl Checkpoint for NoCheckpoint {
    fn commit(&mut self, _changes: &Changeset) -> Result<(), CheckpointError> {
        Ok(())
    }
}

/// Checkpoint that keeps every committed changeset, for inspection.
#[derive(Debug, Default, Clone)]
pub struct CollectingCheckpoint {
    pub commits: Vec<Changeset>,
}

impl Checkpoint for CollectingCheckpoint {
    fn commit(&mut self, changes: &Changeset) -> Result<(), CheckpointError> {
        self.commits.push(changes.clone());
        Ok(())
    }
}

/// Counters of a finished batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchStats {
    pub succeeded: usize,
    pub failed: usize,
    pub checkpoints: usize,
    pub checkpoint_failures: usize,
}

/// Drives per-item isolation and periodic checkpoints.
pub struct BatchRunner<'a> {
    job: &'static str,
    checkpoint: &'a mut dyn Checkpoint,
    every: usize,
    pending: Changeset,
    since_commit: usize,
    stats: BatchStats,
}

impl<'a> BatchRunner<'a> {
    pub fn new(job: &'static str, checkpoint: &'a mut dyn Checkpoint, every: usize) -> Self {
        Self {
            job,
            checkpoint,
            every: every.max(1),
            pending: Changeset::default(),
            since_commit: 0,
            stats: BatchStats::default(),
        }
    }

    /// Run one item. `f` must apply its writes atomically and record them
    /// in the staged changeset; on error nothing is recorded.
    ///
    /// Returns `f`'s value, or `None` when the item failed.
    pub fn item<T>(
        &mut self,
        requirement_id: RequirementId,
        f: impl FnOnce(&mut Changeset) -> Result<T, EngineError>,
    ) -> Option<T> {
        let mut staged = Changeset::default();
        match f(&mut staged) {
            Ok(value) => {
                self.pending.extend(staged);
                self.stats.succeeded += 1;
                self.since_commit += 1;
                if self.since_commit >= self.every {
                    self.flush();
                }
                Some(value)
            }
            Err(e) => {
                self.stats.failed += 1;
                tracing::warn!(
                    job = self.job,
                    requirement_id = %requirement_id,
                    error = %e,
                    "batch item failed; continuing"
                );
                None
            }
        }
    }

    /// Stage writes that are not tied to a single item (e.g. a purge that
    /// precedes the batch).
    pub fn stage(&mut self, changes: Changeset) {
        self.pending.extend(changes);
    }

    fn flush(&mut self) {
        self.since_commit = 0;
        if self.pending.is_empty() {
            return;
        }
        match self.checkpoint.commit(&self.pending) {
            Ok(()) => {
                tracing::debug!(
                    job = self.job,
                    writes = self.pending.len(),
                    "checkpoint committed"
                );
                self.pending = Changeset::default();
                self.stats.checkpoints += 1;
            }
            Err(e) => {
                self.stats.checkpoint_failures += 1;
                tracing::error!(job = self.job, error = %e, "checkpoint failed; will retry");
            }
        }
    }

    /// Flush remaining writes and return the counters.
    pub fn finish(mut self) -> BatchStats {
        self.flush();
        self.stats
    }
}
