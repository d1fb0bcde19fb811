//! Coverage snapshot storage. Snapshots are append-only; the latest per
//! (audit, framework, method) is authoritative.

use std::sync::Arc;

use parking_lot::RwLock;
use xref_core::{AuditId, CoverageMethod, CoverageSnapshot, FrameworkId};

use crate::error::CoverageError;

/// Storage contract for coverage snapshots.
pub trait SnapshotStore: Send + Sync {
    /// Append one computation's snapshots as a unit.
    fn record(&self, snapshots: &[CoverageSnapshot]) -> Result<(), CoverageError>;

    /// Every snapshot of `audit`, newest computation first. Within one
    /// computation the recorded order is kept.
    fn history(&self, audit: AuditId) -> Vec<CoverageSnapshot>;

    /// The most recent snapshot for the triple.
    fn latest(
        &self,
        audit: AuditId,
        framework: FrameworkId,
        method: CoverageMethod,
    ) -> Option<CoverageSnapshot> {
        self.history(audit)
            .into_iter()
            .find(|s| s.framework_id == framework && s.method == method)
    }
}

#[derive(Debug, Default)]
struct Inner {
    /// `(batch, snapshot)` in insertion order.
    rows: Vec<(u64, CoverageSnapshot)>,
    next_batch: u64,
}

/// In-memory [`SnapshotStore`]. Clones share the same data.
#[derive(Debug, Clone, Default)]
pub struct MemorySnapshotStore {
    inner: Arc<RwLock<Inner>>,
}

impl MemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.inner.read().rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every recorded computation, oldest first.
    pub fn batches(&self) -> Vec<Vec<CoverageSnapshot>> {
        let guard = self.inner.read();
        let mut out: Vec<Vec<CoverageSnapshot>> = Vec::new();
        let mut current = None;
        for (batch, snapshot) in &guard.rows {
            if current != Some(*batch) {
                out.push(Vec::new());
                current = Some(*batch);
            }
            if let Some(group) = out.last_mut() {
                group.push(snapshot.clone());
            }
        }
        out
    }
}

impl SnapshotStore for MemorySnapshotStore {
    fn record(&self, snapshots: &[CoverageSnapshot]) -> Result<(), CoverageError> {
        let mut guard = self.inner.write();
        let batch = guard.next_batch;
        guard.next_batch += 1;
        guard
            .rows
            .extend(snapshots.iter().cloned().map(|s| (batch, s)));
        Ok(())
    }

    fn history(&self, audit: AuditId) -> Vec<CoverageSnapshot> {
        let guard = self.inner.read();
        let mut rows: Vec<(usize, u64, &CoverageSnapshot)> = guard
            .rows
            .iter()
            .enumerate()
            .filter(|(_, (_, s))| s.audit_id == audit)
            .map(|(pos, (batch, s))| (pos, *batch, s))
            .collect();
        rows.sort_by(|a, b| {
            b.2.calculated_at
                .cmp(&a.2.calculated_at)
                .then(b.1.cmp(&a.1))
                .then(a.0.cmp(&b.0))
        });
        rows.into_iter().map(|(_, _, s)| s.clone()).collect()
    }
}
