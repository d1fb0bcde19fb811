//! # Coverage Calculation
//!
//! Pure functions over one framework's requirements, the compliant answers
//! of one audit, and the stored mappings.
//!
//! ```text
//! direct       = |{ r ∈ F : r answered compliant }|
//! cross_mapped = |{ r ∈ F : ∃ approved m, sim(m) ≥ min, m.source ∉ F,
//!                            m.target = r, m.source answered compliant }|
//! hybrid       = max(direct, cross_mapped), total = max(totals)
//! ```
//!
//! A requirement covered both ways is counted once. The hybrid never
//! reports less than either method alone.

use std::collections::HashSet;

use serde::Serialize;
use xref_core::{FrameworkId, Mapping, Requirement, RequirementId, ValidationStatus};

/// Covered and total requirement counts with their percentage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct CoverageCounts {
    pub covered: u32,
    pub total: u32,
    /// `covered / total * 100` rounded to two decimals; 0 when `total` is 0.
    pub percentage: f64,
}

impl CoverageCounts {
    pub fn new(covered: u32, total: u32) -> Self {
        Self {
            covered,
            total,
            percentage: percentage(covered, total),
        }
    }
}

/// Percentage in `[0, 100]`, two decimals.
pub fn percentage(covered: u32, total: u32) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let raw = f64::from(covered) / f64::from(total) * 100.0;
    ((raw * 100.0).round() / 100.0).clamp(0.0, 100.0)
}

/// Which mappings carry coverage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CrossMapRule {
    /// Approved mappings below this similarity are ignored.
    pub min_similarity: f64,
    /// Also let an answered target cover its source.
    pub bidirectional: bool,
}

impl Default for CrossMapRule {
    fn default() -> Self {
        Self {
            min_similarity: 0.75,
            bidirectional: false,
        }
    }
}

/// Requirements answered compliant.
pub fn direct_coverage(
    requirements: &[Requirement],
    compliant: &HashSet<RequirementId>,
) -> CoverageCounts {
    let covered = requirements
        .iter()
        .filter(|r| compliant.contains(&r.id))
        .count();
    CoverageCounts::new(count(covered), count(requirements.len()))
}

/// Requirements of `framework` reached by at least one qualifying mapping
/// from an answered requirement of another framework.
pub fn cross_mapped_coverage<F>(
    framework: FrameworkId,
    requirements: &[Requirement],
    compliant: &HashSet<RequirementId>,
    mappings: &[Mapping],
    framework_of: F,
    rule: CrossMapRule,
) -> CoverageCounts
where
    F: Fn(RequirementId) -> Option<FrameworkId>,
{
    let foreign = |id: RequirementId| framework_of(id).is_some_and(|fw| fw != framework);
    let mut reached: HashSet<RequirementId> = HashSet::new();

    for m in mappings.iter().filter(|m| qualifies(m, rule.min_similarity)) {
        let (source, target) = (m.source_requirement_id, m.target_requirement_id);
        if compliant.contains(&source) && foreign(source) {
            reached.insert(target);
        }
        if rule.bidirectional && compliant.contains(&target) && foreign(target) {
            reached.insert(source);
        }
    }

    let covered = requirements
        .iter()
        .filter(|r| reached.contains(&r.id))
        .count();
    CoverageCounts::new(count(covered), count(requirements.len()))
}

fn qualifies(mapping: &Mapping, min_similarity: f64) -> bool {
    mapping.validation_status == ValidationStatus::Approved
        && mapping.semantic_similarity >= min_similarity
}

/// Hybrid of the two methods.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HybridCoverage {
    pub counts: CoverageCounts,
    /// Set when the independent maxima disagreed and `covered` was clamped
    /// down to `total`.
    pub clamped: bool,
}

/// `covered = max`, `total = max`, clamping `covered` to `total`.
pub fn hybrid_coverage(direct: CoverageCounts, cross: CoverageCounts) -> HybridCoverage {
    let total = direct.total.max(cross.total);
    let covered = direct.covered.max(cross.covered);
    let clamped = covered > total;
    HybridCoverage {
        counts: CoverageCounts::new(covered.min(total), total),
        clamped,
    }
}

fn count(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use xref_core::{MappingCreator, MappingId, MappingType, Timestamp};

    fn requirement(fw: FrameworkId, code: &str) -> Requirement {
        Requirement::new(fw, code, code, "")
    }

    fn approved(source: RequirementId, target: RequirementId, s: f64) -> Mapping {
        Mapping {
            id: MappingId::new(),
            source_requirement_id: source,
            target_requirement_id: target,
            mapping_type: MappingType::for_similarity(s),
            semantic_similarity: s,
            confidence: s,
            domain_match: false,
            rationale: None,
            created_by: MappingCreator::Automated,
            validation_status: ValidationStatus::Approved,
            validated_by: None,
            validated_at: None,
            created_at: Timestamp::now(),
        }
    }

    #[test]
    fn percentage_rounding_and_zero_total() {
        assert_eq!(percentage(0, 0), 0.0);
        assert_eq!(percentage(1, 3), 33.33);
        assert_eq!(percentage(2, 3), 66.67);
        assert_eq!(percentage(3, 3), 100.0);
    }

    #[test]
    fn cross_mapped_scenario() {
        let fw_a = FrameworkId::new();
        let fw_b = FrameworkId::new();
        let r1 = requirement(fw_a, "A.1");
        let r2 = requirement(fw_b, "B.1");
        let compliant: HashSet<_> = [r2.id].into_iter().collect();
        let mappings = vec![approved(r2.id, r1.id, 0.9)];
        let owner = |id: RequirementId| {
            if id == r1.id {
                Some(fw_a)
            } else if id == r2.id {
                Some(fw_b)
            } else {
                None
            }
        };

        let reqs = [r1.clone()];
        let direct = direct_coverage(&reqs, &compliant);
        let cross = cross_mapped_coverage(
            fw_a,
            &reqs,
            &compliant,
            &mappings,
            owner,
            CrossMapRule::default(),
        );
        assert_eq!(direct, CoverageCounts::new(0, 1));
        assert_eq!(cross, CoverageCounts::new(1, 1));
        assert_eq!(hybrid_coverage(direct, cross).counts.percentage, 100.0);
    }

    #[test]
    fn direction_and_threshold_are_honoured() {
        let fw_a = FrameworkId::new();
        let fw_b = FrameworkId::new();
        let r1 = requirement(fw_a, "A.1");
        let r2 = requirement(fw_b, "B.1");
        let compliant: HashSet<_> = [r2.id].into_iter().collect();
        let owner = |id: RequirementId| Some(if id == r1.id { fw_a } else { fw_b });
        let reqs = [r1.clone()];

        // r1 is the source; the answered side is the target.
        let reversed = vec![approved(r1.id, r2.id, 0.9)];
        let one_way =
            cross_mapped_coverage(fw_a, &reqs, &compliant, &reversed, owner, CrossMapRule::default());
        assert_eq!(one_way.covered, 0);
        let both = cross_mapped_coverage(
            fw_a,
            &reqs,
            &compliant,
            &reversed,
            owner,
            CrossMapRule {
                bidirectional: true,
                ..CrossMapRule::default()
            },
        );
        assert_eq!(both.covered, 1);

        let weak = vec![approved(r2.id, r1.id, 0.74)];
        let cross =
            cross_mapped_coverage(fw_a, &reqs, &compliant, &weak, owner, CrossMapRule::default());
        assert_eq!(cross.covered, 0);

        let mut pending = approved(r2.id, r1.id, 0.9);
        pending.validation_status = ValidationStatus::Pending;
        let cross = cross_mapped_coverage(
            fw_a,
            &reqs,
            &compliant,
            &[pending],
            owner,
            CrossMapRule::default(),
        );
        assert_eq!(cross.covered, 0);
    }

    #[test]
    fn multiple_mappings_count_once() {
        let fw_a = FrameworkId::new();
        let fw_b = FrameworkId::new();
        let r1 = requirement(fw_a, "A.1");
        let b1 = requirement(fw_b, "B.1");
        let b2 = requirement(fw_b, "B.2");
        let compliant: HashSet<_> = [b1.id, b2.id].into_iter().collect();
        let mappings = vec![approved(b1.id, r1.id, 0.8), approved(b2.id, r1.id, 0.96)];
        let owner = |id: RequirementId| Some(if id == r1.id { fw_a } else { fw_b });
        let cross = cross_mapped_coverage(
            fw_a,
            &[r1.clone()],
            &compliant,
            &mappings,
            owner,
            CrossMapRule::default(),
        );
        assert_eq!(cross, CoverageCounts::new(1, 1));
    }

    #[test]
    fn hybrid_clamps_inconsistent_totals() {
        let hybrid = hybrid_coverage(CoverageCounts::new(5, 5), CoverageCounts::new(0, 3));
        assert!(!hybrid.clamped);
        let hybrid = hybrid_coverage(
            CoverageCounts {
                covered: 7,
                total: 4,
                percentage: 100.0,
            },
            CoverageCounts::new(2, 6),
        );
        assert!(hybrid.clamped);
        assert_eq!(hybrid.counts, CoverageCounts::new(6, 6));
    }

    proptest! {
        #[test]
        fn percentage_in_bounds(covered in 0u32..10_000, total in 0u32..10_000) {
            let p = percentage(covered.min(total), total);
            prop_assert!((0.0..=100.0).contains(&p));
            if total == 0 {
                prop_assert_eq!(p, 0.0);
            }
        }

        #[test]
        fn hybrid_dominates(
            total in 0u32..500,
            d in 0u32..500,
            c in 0u32..500,
        ) {
            let direct = CoverageCounts::new(d.min(total), total);
            let cross = CoverageCounts::new(c.min(total), total);
            let hybrid = hybrid_coverage(direct, cross).counts;
            prop_assert!(hybrid.percentage >= direct.percentage);
            prop_assert!(hybrid.percentage >= cross.percentage);
            prop_assert!(hybrid.covered <= hybrid.total);
        }
    }
}
