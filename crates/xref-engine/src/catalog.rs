//! # Requirement Catalog
//!
//! Read access to frameworks and requirements, as supplied by the framework
//! import subsystem. The engine never mutates catalog records.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use xref_core::{Framework, FrameworkId, Requirement, RequirementId};

/// Source of framework and requirement records.
pub trait RequirementCatalog: Send + Sync {
    fn framework(&self, id: FrameworkId) -> Option<Framework>;

    /// All frameworks, ordered by code.
    fn frameworks(&self) -> Vec<Framework>;

    fn requirement(&self, id: RequirementId) -> Option<Requirement>;

    /// Requirements of one framework in import order.
    fn requirements_of(&self, framework: FrameworkId) -> Vec<Requirement>;

    /// Active frameworks, ordered by code.
    fn active_frameworks(&self) -> Vec<Framework> {
        self.frameworks().into_iter().filter(|f| f.is_active).collect()
    }

    /// The framework a requirement belongs to.
    fn framework_of(&self, id: RequirementId) -> Option<FrameworkId> {
        self.requirement(id).map(|r| r.framework_id)
    }
}

#[derive(Debug)]
struct Inner {
    frameworks: HashMap<FrameworkId, Framework>,
    requirements: HashMap<RequirementId, Requirement>,
    next_sequence: u64,
}

/// In-memory catalog. Clones share the same data.
#[derive(Debug, Clone)]
pub struct MemoryCatalog {
    inner: Arc<RwLock<Inner>>,
}

impl Default for MemoryCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(Inner {
                frameworks: HashMap::new(),
                requirements: HashMap::new(),
                next_sequence: 1,
            })),
        }
    }

    pub fn insert_framework(&self, framework: Framework) {
        self.inner.write().frameworks.insert(framework.id, framework);
    }

    /// Insert or replace a requirement.
    ///
    /// A zero `sequence` is replaced by the next import position; non-zero
    /// sequences (e.g. hydrated from the database) are kept.
    pub fn insert_requirement(&self, mut requirement: Requirement) -> Requirement {
        let mut guard = self.inner.write();
        if requirement.sequence == 0 {
            requirement.sequence = guard.next_sequence;
        }
        guard.next_sequence = guard.next_sequence.max(requirement.sequence + 1);
        guard
            .requirements
            .insert(requirement.id, requirement.clone());
        requirement
    }

    /// Remove a requirement, e.g. after an import correction.
    pub fn remove_requirement(&self, id: RequirementId) -> Option<Requirement> {
        self.inner.write().requirements.remove(&id)
    }

    pub fn requirement_count(&self) -> usize {
        self.inner.read().requirements.len()
    }
}

impl RequirementCatalog for MemoryCatalog {
    fn framework(&self, id: FrameworkId) -> Option<Framework> {
        self.inner.read().frameworks.get(&id).cloned()
    }

    fn frameworks(&self) -> Vec<Framework> {
        let mut all: Vec<Framework> = self.inner.read().frameworks.values().cloned().collect();
        all.sort_by(|a, b| a.code.cmp(&b.code).then(a.id.cmp(&b.id)));
        all
    }

    fn requirement(&self, id: RequirementId) -> Option<Requirement> {
        self.inner.read().requirements.get(&id).cloned()
    }

    fn requirements_of(&self, framework: FrameworkId) -> Vec<Requirement> {
        let mut reqs: Vec<Requirement> = self
            .inner
            .read()
            .requirements
            .values()
            .filter(|r| r.framework_id == framework)
            .cloned()
            .collect();
        reqs.sort_by_key(|r| r.sequence);
        reqs
    }
}
