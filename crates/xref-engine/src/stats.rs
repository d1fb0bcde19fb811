//! Mapping statistics and equivalence lookups.

use serde::Serialize;
use xref_core::{FrameworkId, MappingId, MappingType, RequirementId, ValidationStatus};

use crate::error::EngineError;
use crate::validation::{RequirementSummary, ValidationWorkflow};

/// Counts by review state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub approved: usize,
    pub pending: usize,
    pub rejected: usize,
}

/// Counts by mapping tier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TypeCounts {
    pub equivalent: usize,
    pub similar: usize,
    pub related: usize,
    pub weak_relation: usize,
}

/// Aggregate view over stored mappings.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MappingStatistics {
    pub framework_id: Option<FrameworkId>,
    pub total_mappings: usize,
    pub validation_status: StatusCounts,
    pub mapping_types: TypeCounts,
    /// Mean similarity, 0.0 when there are no mappings.
    pub average_similarity: f64,
    /// `approved / total * 100`, two decimals, 0.0 when there are no mappings.
    pub approval_rate: f64,
}

/// A mapping seen from one of its requirements.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Equivalence {
    pub mapping_id: MappingId,
    pub mapping_type: MappingType,
    pub semantic_similarity: f64,
    pub validation_status: ValidationStatus,
    /// The requirement on the other side.
    pub counterpart: RequirementSummary,
    pub domain: Option<String>,
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

impl ValidationWorkflow {
    /// Totals over all mappings, or over those with either side in
    /// `framework`.
    pub fn mapping_statistics(&self, framework: Option<FrameworkId>) -> MappingStatistics {
        let mut stats = MappingStatistics {
            framework_id: framework,
            ..MappingStatistics::default()
        };
        let mut similarity_sum = 0.0;

        for m in self.mappings.list() {
            if let Some(fw) = framework {
                let touches = [m.source_requirement_id, m.target_requirement_id]
                    .into_iter()
                    .any(|id| self.catalog.framework_of(id) == Some(fw));
                if !touches {
                    continue;
                }
            }
            stats.total_mappings += 1;
            similarity_sum += m.semantic_similarity;
            match m.validation_status {
                ValidationStatus::Approved => stats.validation_status.approved += 1,
                ValidationStatus::Pending => stats.validation_status.pending += 1,
                ValidationStatus::Rejected => stats.validation_status.rejected += 1,
            }
            match m.mapping_type {
                MappingType::Equivalent => stats.mapping_types.equivalent += 1,
                MappingType::Similar => stats.mapping_types.similar += 1,
                MappingType::Related => stats.mapping_types.related += 1,
                MappingType::WeakRelation => stats.mapping_types.weak_relation += 1,
            }
        }

        if stats.total_mappings > 0 {
            let total = stats.total_mappings as f64;
            stats.average_similarity = similarity_sum / total;
            stats.approval_rate = round2(stats.validation_status.approved as f64 / total * 100.0);
        }
        stats
    }

    /// Non-rejected mappings touching `requirement`, strongest first, ties
    /// broken by the counterpart's official code.
    pub fn equivalences(&self, requirement: RequirementId) -> Result<Vec<Equivalence>, EngineError> {
        if self.catalog.requirement(requirement).is_none() {
            return Err(EngineError::RequirementNotFound(requirement));
        }
        let mut out: Vec<Equivalence> = self
            .mappings
            .list()
            .into_iter()
            .filter(|m| m.validation_status != ValidationStatus::Rejected)
            .filter_map(|m| {
                let other = m.counterpart(requirement)?;
                let counterpart = self.summarize(other)?;
                let domain = self
                    .catalog
                    .requirement(other)
                    .and_then(|r| r.resolved_domain_label().map(str::to_string));
                Some(Equivalence {
                    mapping_id: m.id,
                    mapping_type: m.mapping_type,
                    semantic_similarity: m.semantic_similarity,
                    validation_status: m.validation_status,
                    counterpart,
                    domain,
                })
            })
            .collect();
        out.sort_by(|a, b| {
            b.semantic_similarity
                .total_cmp(&a.semantic_similarity)
                .then_with(|| a.counterpart.official_code.cmp(&b.counterpart.official_code))
        });
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::tests::{fixture, mapping, req};

    #[test]
    fn empty_repository_has_zero_rates() {
        let f = fixture();
        let stats = f.workflow.mapping_statistics(None);
        assert_eq!(stats.total_mappings, 0);
        assert_eq!(stats.approval_rate, 0.0);
        assert_eq!(stats.average_similarity, 0.0);
    }

    #[test]
    fn counts_and_approval_rate() {
        let f = fixture();
        let a1 = req(&f, f.fw_a, "A.1");
        let b1 = req(&f, f.fw_b, "B.1");
        let b2 = req(&f, f.fw_b, "B.2");
        let c1 = req(&f, f.fw_c, "C.1");
        mapping(&f, a1, b1, 0.96, ValidationStatus::Approved);
        mapping(&f, a1, b2, 0.80, ValidationStatus::Pending);
        mapping(&f, b2, c1, 0.90, ValidationStatus::Rejected);

        let all = f.workflow.mapping_statistics(None);
        assert_eq!(all.total_mappings, 3);
        assert_eq!(
            all.validation_status,
            StatusCounts {
                approved: 1,
                pending: 1,
                rejected: 1
            }
        );
        assert_eq!(all.mapping_types.equivalent, 1);
        assert_eq!(all.mapping_types.similar, 1);
        assert_eq!(all.mapping_types.related, 1);
        assert_eq!(all.approval_rate, 33.33);
        assert!((all.average_similarity - 0.88).abs() < 1e-9);

        let for_a = f.workflow.mapping_statistics(Some(f.fw_a));
        assert_eq!(for_a.total_mappings, 2);
        assert_eq!(for_a.approval_rate, 50.0);
    }

    #[test]
    fn equivalences_skip_rejected_and_sort() {
        let f = fixture();
        let a1 = req(&f, f.fw_a, "A.1");
        let b1 = req(&f, f.fw_b, "B.9");
        let b2 = req(&f, f.fw_b, "B.2");
        let c1 = req(&f, f.fw_c, "C.1");
        mapping(&f, a1, b1, 0.85, ValidationStatus::Pending);
        mapping(&f, b2, a1, 0.85, ValidationStatus::Approved);
        mapping(&f, a1, c1, 0.99, ValidationStatus::Rejected);

        let codes: Vec<_> = f
            .workflow
            .equivalences(a1)
            .unwrap()
            .into_iter()
            .map(|e| e.counterpart.official_code)
            .collect();
        assert_eq!(codes, vec!["B.2", "B.9"]);
    }

    #[test]
    fn equivalences_unknown_requirement() {
        let f = fixture();
        assert!(matches!(
            f.workflow.equivalences(RequirementId::new()),
            Err(EngineError::RequirementNotFound(_))
        ));
    }
}
