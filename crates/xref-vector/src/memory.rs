//! # In-Memory Vector Store
//!
//! Exact (brute-force) nearest-neighbour search behind a
//! `parking_lot::RwLock`. Requirement catalogs are small enough that a
//! linear scan per query is cheaper than maintaining an ANN index, and it
//! keeps ordering fully deterministic: distance first, then the
//! requirement's catalog sequence, then its id.
//!
//! Clones share the same underlying data.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use xref_core::RequirementId;

use crate::error::VectorStoreError;
use crate::record::{EmbeddingRecord, Neighbor};
use crate::VectorStore;

#[derive(Debug)]
struct Entry {
    record: EmbeddingRecord,
    /// Position of the requirement's first insertion.
    seq: u64,
}

#[derive(Debug, Default)]
struct Inner {
    entries: HashMap<RequirementId, Entry>,
    next_seq: u64,
    dimension: Option<usize>,
}

/// Thread-safe in-memory [`VectorStore`].
#[derive(Debug, Clone)]
pub struct MemoryVectorStore {
    inner: Arc<RwLock<Inner>>,
    available: Arc<AtomicBool>,
}

impl Default for MemoryVectorStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryVectorStore {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(Inner::default())),
            available: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Simulate the index going down or coming back. While unavailable,
    /// every operation fails with [`VectorStoreError::Unavailable`].
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::Relaxed);
    }

    /// Dimension of the stored vectors, if any are stored.
    pub fn dimension(&self) -> Option<usize> {
        self.inner.read().dimension
    }

    pub fn len(&self) -> usize {
        self.inner.read().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every stored record, in insertion order.
    pub fn records(&self) -> Vec<EmbeddingRecord> {
        let guard = self.inner.read();
        let mut entries: Vec<&Entry> = guard.entries.values().collect();
        entries.sort_by_key(|e| e.seq);
        entries.into_iter().map(|e| e.record.clone()).collect()
    }

    fn check_available(&self) -> Result<(), VectorStoreError> {
        if self.available.load(Ordering::Relaxed) {
            Ok(())
        } else {
            Err(VectorStoreError::Unavailable {
                reason: "in-memory index disabled".into(),
            })
        }
    }
}

impl VectorStore for MemoryVectorStore {
    fn upsert(&self, record: EmbeddingRecord) -> Result<(), VectorStoreError> {
        self.check_available()?;
        let mut guard = self.inner.write();
        let actual = record.vector.len();

        // A lone entry being replaced may change the store's dimension.
        let sole_entry = guard.entries.len() == 1
            && guard.entries.contains_key(&record.requirement_id);
        let current = guard.dimension;
        match current {
            Some(expected) if expected != actual && !sole_entry => {
                return Err(VectorStoreError::DimensionMismatch { expected, actual });
            }
            _ => guard.dimension = Some(actual),
        }

        let id = record.requirement_id;
        if let Some(entry) = guard.entries.get_mut(&id) {
            entry.record = record;
        } else {
            let seq = guard.next_seq;
            guard.next_seq += 1;
            guard.entries.insert(id, Entry { record, seq });
        }
        tracing::trace!(requirement_id = %id, dimension = actual, "embedding upserted");
        Ok(())
    }

    fn get(&self, id: RequirementId) -> Result<Option<EmbeddingRecord>, VectorStoreError> {
        self.check_available()?;
        Ok(self.inner.read().entries.get(&id).map(|e| e.record.clone()))
    }

    fn nearest(
        &self,
        query: &[f32],
        k: usize,
        active_only: bool,
    ) -> Result<Vec<Neighbor>, VectorStoreError> {
        self.check_available()?;
        let guard = self.inner.read();
        if let Some(expected) = guard.dimension {
            if expected != query.len() {
                return Err(VectorStoreError::DimensionMismatch {
                    expected,
                    actual: query.len(),
                });
            }
        }

        let mut scored: Vec<(f32, u64, RequirementId)> = guard
            .entries
            .values()
            .filter(|e| !active_only || e.record.active)
            .map(|e| {
                let r = &e.record;
                (l2_distance(&r.vector, query), r.sequence, r.requirement_id)
            })
            .collect();
        // Hydration order differs from indexing order; ties must not depend
        // on either.
        scored.sort_by(|a, b| {
            a.0.total_cmp(&b.0)
                .then(a.1.cmp(&b.1))
                .then(a.2.cmp(&b.2))
        });
        scored.truncate(k);

        Ok(scored
            .into_iter()
            .map(|(distance, _, requirement_id)| Neighbor {
                requirement_id,
                distance,
            })
            .collect())
    }

    fn remove(&self, id: RequirementId) -> Result<bool, VectorStoreError> {
        self.check_available()?;
        let mut guard = self.inner.write();
        let removed = guard.entries.remove(&id).is_some();
        if guard.entries.is_empty() {
            guard.dimension = None;
        }
        Ok(removed)
    }

    fn requirement_ids(&self) -> Result<Vec<RequirementId>, VectorStoreError> {
        self.check_available()?;
        let guard = self.inner.read();
        let mut ids: Vec<(u64, RequirementId)> =
            guard.entries.iter().map(|(id, e)| (e.seq, *id)).collect();
        ids.sort_unstable();
        Ok(ids.into_iter().map(|(_, id)| id).collect())
    }

    fn set_active(&self, id: RequirementId, active: bool) -> Result<(), VectorStoreError> {
        self.check_available()?;
        if let Some(entry) = self.inner.write().entries.get_mut(&id) {
            entry.record.active = active;
        }
        Ok(())
    }
}

fn l2_distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f32>()
        .sqrt()
}
