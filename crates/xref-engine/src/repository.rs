//! # Mapping Repository
//!
//! Storage for mapping records. The unordered-pair uniqueness constraint is
//! enforced here: at most one mapping exists for any `{a, b}` pair no
//! matter which side was the source.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use xref_core::{Mapping, MappingCreator, MappingId, RequirementId, ValidationStatus};

use crate::dedupe::PairKey;
use crate::error::RepositoryError;

/// Result of merging detected candidates into the repository.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergeOutcome {
    /// Mappings inserted for previously unmapped pairs.
    pub created: Vec<Mapping>,
    /// Existing mappings whose scores were raised by a stronger candidate.
    pub updated: Vec<Mapping>,
    /// Candidates that collided with an existing pair.
    pub merged: usize,
}

/// Storage contract for mappings.
pub trait MappingRepository: Send + Sync {
    fn get(&self, id: MappingId) -> Option<Mapping>;

    /// The mapping for an unordered pair, in either direction.
    fn find_pair(&self, a: RequirementId, b: RequirementId) -> Option<Mapping>;

    /// All mappings, oldest first.
    fn list(&self) -> Vec<Mapping>;

    /// Insert or replace a single record, keyed by its pair. Used for
    /// hydration and manual records.
    fn insert(&self, mapping: Mapping) -> Result<(), RepositoryError>;

    /// Merge detected candidates in one atomic step.
    ///
    /// For a new pair the candidate is inserted. For an existing pair the
    /// stored record wins, unless it is still an unreviewed automated
    /// mapping with a lower similarity, in which case its scores and status
    /// are replaced by the candidate's (its id and creation time are kept).
    fn merge(&self, candidates: Vec<Mapping>) -> Result<MergeOutcome, RepositoryError>;

    /// Apply `f` to a mapping under the write lock. `None` if absent.
    fn update(&self, id: MappingId, f: &mut dyn FnMut(&mut Mapping)) -> Option<Mapping>;

    /// Remove every mapping matching `predicate`, returning them.
    fn remove_where(&self, predicate: &dyn Fn(&Mapping) -> bool) -> Vec<Mapping>;

    fn len(&self) -> usize {
        self.list().len()
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Default)]
struct Inner {
    by_id: HashMap<MappingId, Mapping>,
    by_pair: HashMap<PairKey, MappingId>,
}

impl Inner {
    fn put(&mut self, mapping: Mapping) {
        let key = PairKey::of(&mapping);
        if let Some(old) = self.by_pair.insert(key, mapping.id) {
            if old != mapping.id {
                self.by_id.remove(&old);
            }
        }
        self.by_id.insert(mapping.id, mapping);
    }
}

/// In-memory [`MappingRepository`]. Clones share the same data.
#[derive(Debug, Clone, Default)]
pub struct MemoryMappingRepository {
    inner: Arc<RwLock<Inner>>,
}

impl MemoryMappingRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

fn check_endpoints(mapping: &Mapping) -> Result<(), RepositoryError> {
    if mapping.source_requirement_id == mapping.target_requirement_id {
        return Err(RepositoryError::SelfMapping(mapping.source_requirement_id));
    }
    Ok(())
}

impl MappingRepository for MemoryMappingRepository {
    fn get(&self, id: MappingId) -> Option<Mapping> {
        self.inner.read().by_id.get(&id).cloned()
    }

    fn find_pair(&self, a: RequirementId, b: RequirementId) -> Option<Mapping> {
        let guard = self.inner.read();
        guard
            .by_pair
            .get(&PairKey::new(a, b))
            .and_then(|id| guard.by_id.get(id))
            .cloned()
    }

    fn list(&self) -> Vec<Mapping> {
        let mut all: Vec<Mapping> = self.inner.read().by_id.values().cloned().collect();
        all.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        all
    }

    fn insert(&self, mapping: Mapping) -> Result<(), RepositoryError> {
        check_endpoints(&mapping)?;
        self.inner.write().put(mapping);
        Ok(())
    }

    fn merge(&self, candidates: Vec<Mapping>) -> Result<MergeOutcome, RepositoryError> {
        // Validate everything before the first write.
        for candidate in &candidates {
            check_endpoints(candidate)?;
        }

        let mut guard = self.inner.write();
        let mut outcome = MergeOutcome::default();
        for candidate in candidates {
            let Some(existing_id) = guard.by_pair.get(&PairKey::of(&candidate)).copied() else {
                outcome.created.push(candidate.clone());
                guard.put(candidate);
                continue;
            };
            outcome.merged += 1;
            let Some(existing) = guard.by_id.get_mut(&existing_id) else {
                continue;
            };
            let replaceable = existing.created_by == MappingCreator::Automated
                && existing.validation_status == ValidationStatus::Pending
                && candidate.semantic_similarity > existing.semantic_similarity;
            if replaceable {
                existing.mapping_type = candidate.mapping_type;
                existing.semantic_similarity = candidate.semantic_similarity;
                existing.confidence = candidate.confidence;
                existing.domain_match = candidate.domain_match;
                existing.rationale = candidate.rationale;
                existing.validation_status = candidate.validation_status;
                outcome.updated.push(existing.clone());
            }
        }
        Ok(outcome)
    }

    fn update(&self, id: MappingId, f: &mut dyn FnMut(&mut Mapping)) -> Option<Mapping> {
        let mut guard = self.inner.write();
        let entry = guard.by_id.get_mut(&id)?;
        f(entry);
        Some(entry.clone())
    }

    fn remove_where(&self, predicate: &dyn Fn(&Mapping) -> bool) -> Vec<Mapping> {
        let mut guard = self.inner.write();
        let doomed: Vec<MappingId> = guard
            .by_id
            .values()
            .filter(|m| predicate(m))
            .map(|m| m.id)
            .collect();
        let mut removed = Vec::with_capacity(doomed.len());
        for id in doomed {
            if let Some(m) = guard.by_id.remove(&id) {
                guard.by_pair.remove(&PairKey::of(&m));
                removed.push(m);
            }
        }
        removed
    }

    fn len(&self) -> usize {
        self.inner.read().by_id.len()
    }
}
