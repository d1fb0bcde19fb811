//! Audit answer facts, consumed read-only.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use parking_lot::RwLock;
use xref_core::{AnswerFact, AuditId, RequirementId};

/// Read access to the answers of an audit.
pub trait AnswerSource: Send + Sync {
    /// Every answer fact recorded for `audit`. Unknown audits have none.
    fn answers(&self, audit: AuditId) -> Vec<AnswerFact>;

    /// Requirements with at least one compliant answer in `audit`.
    fn compliant_requirements(&self, audit: AuditId) -> HashSet<RequirementId> {
        self.answers(audit)
            .into_iter()
            .filter(|a| a.compliant)
            .map(|a| a.requirement_id)
            .collect()
    }
}

/// In-memory answers. Clones share the same data.
#[derive(Debug, Clone, Default)]
pub struct MemoryAnswerSource {
    inner: Arc<RwLock<HashMap<AuditId, Vec<AnswerFact>>>>,
}

impl MemoryAnswerSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, audit: AuditId, fact: AnswerFact) {
        self.inner.write().entry(audit).or_default().push(fact);
    }

    pub fn record_all(&self, audit: AuditId, facts: impl IntoIterator<Item = AnswerFact>) {
        self.inner.write().entry(audit).or_default().extend(facts);
    }

    /// Audits with at least one answer.
    pub fn audits(&self) -> Vec<AuditId> {
        let mut ids: Vec<AuditId> = self.inner.read().keys().copied().collect();
        ids.sort();
        ids
    }
}

impl AnswerSource for MemoryAnswerSource {
    fn answers(&self, audit: AuditId) -> Vec<AnswerFact> {
        self.inner.read().get(&audit).cloned().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn any_compliant_answer_counts() {
        let source = MemoryAnswerSource::new();
        let audit = AuditId::new();
        let r = RequirementId::new();
        source.record(audit, AnswerFact { requirement_id: r, compliant: false });
        source.record(audit, AnswerFact { requirement_id: r, compliant: true });
        assert!(source.compliant_requirements(audit).contains(&r));
    }

    #[test]
    fn unknown_audit_is_empty() {
        let source = MemoryAnswerSource::new();
        assert!(source.answers(AuditId::new()).is_empty());
        assert!(source.audits().is_empty());
    }
}
