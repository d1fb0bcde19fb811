//! # Coverage Service
//!
//! Computes coverage for every active framework (or one) of an audit,
//! persists direct, cross-mapped and hybrid snapshots, and reports over the
//! stored history.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use serde::Serialize;
use xref_core::{
    AuditId, CoverageMethod, CoverageSnapshot, Framework, FrameworkId, Mapping, RequirementId,
    SnapshotId, Timestamp,
};
use xref_engine::{EngineConfig, MappingRepository, RequirementCatalog};

use crate::answers::AnswerSource;
use crate::calculator::{
    cross_mapped_coverage, direct_coverage, hybrid_coverage, CoverageCounts, CrossMapRule,
};
use crate::error::CoverageError;
use crate::snapshot::SnapshotStore;

/// Coverage of one framework in one audit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameworkCoverage {
    pub framework_id: FrameworkId,
    pub framework_code: String,
    pub framework_name: String,
    pub framework_version: Option<String>,
    pub direct: CoverageCounts,
    pub cross_mapped: CoverageCounts,
    /// The headline figure.
    pub hybrid: CoverageCounts,
    pub calculated_at: Timestamp,
}

impl FrameworkCoverage {
    pub fn percentage(&self) -> f64 {
        self.hybrid.percentage
    }
}

/// One row of the coverage history.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoverageHistoryEntry {
    pub calculated_at: Timestamp,
    pub framework_id: FrameworkId,
    pub framework_code: String,
    pub framework_name: String,
    pub method: CoverageMethod,
    pub covered: u32,
    pub total: u32,
    pub percentage: f64,
}

/// Headline figures across the frameworks of an audit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoverageSummary {
    pub audit_id: AuditId,
    pub total_frameworks: usize,
    pub average_coverage: f64,
    pub best_framework: Option<String>,
    pub worst_framework: Option<String>,
    pub frameworks_above_80: usize,
    pub frameworks_below_50: usize,
}

/// Spread of one framework's coverage across audits.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameworkComparison {
    pub min_coverage: f64,
    pub max_coverage: f64,
    pub avg_coverage: f64,
    pub audits_count: usize,
}

/// Coverage of one audit within a comparison.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditCoverage {
    pub audit_id: AuditId,
    pub frameworks: Vec<FrameworkCoverage>,
}

/// Coverage compared across audits, keyed by framework code.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditComparison {
    pub audits_compared: usize,
    pub audits: Vec<AuditCoverage>,
    pub frameworks: BTreeMap<String, FrameworkComparison>,
}

/// Coverage operations over the catalog, mappings and answers.
#[derive(Clone)]
pub struct CoverageService {
    catalog: Arc<dyn RequirementCatalog>,
    mappings: Arc<dyn MappingRepository>,
    answers: Arc<dyn AnswerSource>,
    snapshots: Arc<dyn SnapshotStore>,
    rule: CrossMapRule,
}

impl CoverageService {
    pub fn new(
        catalog: Arc<dyn RequirementCatalog>,
        mappings: Arc<dyn MappingRepository>,
        answers: Arc<dyn AnswerSource>,
        snapshots: Arc<dyn SnapshotStore>,
        config: &EngineConfig,
    ) -> Self {
        Self {
            catalog,
            mappings,
            answers,
            snapshots,
            rule: CrossMapRule {
                min_similarity: config.coverage_min_similarity,
                bidirectional: config.coverage_bidirectional,
            },
        }
    }

    /// Compute and persist coverage for `audit`.
    ///
    /// With `framework`, only that framework (active or not); otherwise
    /// every active framework, ordered by code. Three snapshots are stored
    /// per framework.
    ///
    /// # Errors
    ///
    /// [`CoverageError::FrameworkNotFound`] for an unknown framework, or a
    /// snapshot store failure.
    pub fn coverage(
        &self,
        audit: AuditId,
        framework: Option<FrameworkId>,
    ) -> Result<Vec<FrameworkCoverage>, CoverageError> {
        let frameworks = match framework {
            Some(id) => vec![self
                .catalog
                .framework(id)
                .ok_or(CoverageError::FrameworkNotFound(id))?],
            None => self.catalog.active_frameworks(),
        };

        let compliant = self.answers.compliant_requirements(audit);
        let mappings = self.mappings.list();
        let calculated_at = Timestamp::now();

        let mut results = Vec::with_capacity(frameworks.len());
        let mut snapshots = Vec::with_capacity(frameworks.len() * 3);
        for fw in frameworks {
            let result = self.framework_coverage(audit, &fw, &compliant, &mappings, calculated_at);
            for (method, counts) in [
                (CoverageMethod::Direct, result.direct),
                (CoverageMethod::CrossMapped, result.cross_mapped),
                (CoverageMethod::Hybrid, result.hybrid),
            ] {
                snapshots.push(CoverageSnapshot {
                    id: SnapshotId::new(),
                    audit_id: audit,
                    framework_id: fw.id,
                    covered: counts.covered,
                    total: counts.total,
                    percentage: counts.percentage,
                    method,
                    calculated_at,
                });
            }
            results.push(result);
        }

        self.snapshots.record(&snapshots)?;
        metrics::counter!("xref_coverage_computations_total").increment(results.len() as u64);
        tracing::info!(
            audit_id = %audit,
            frameworks = results.len(),
            "coverage computed"
        );
        Ok(results)
    }

    fn framework_coverage(
        &self,
        audit: AuditId,
        fw: &Framework,
        compliant: &HashSet<RequirementId>,
        mappings: &[Mapping],
        calculated_at: Timestamp,
    ) -> FrameworkCoverage {
        let requirements: Vec<_> = self
            .catalog
            .requirements_of(fw.id)
            .into_iter()
            .filter(|r| r.is_active)
            .collect();

        let direct = direct_coverage(&requirements, compliant);
        let cross_mapped = cross_mapped_coverage(
            fw.id,
            &requirements,
            compliant,
            mappings,
            |id| self.catalog.framework_of(id),
            self.rule,
        );
        let hybrid = hybrid_coverage(direct, cross_mapped);
        if hybrid.clamped {
            tracing::warn!(
                audit_id = %audit,
                framework = %fw.code,
                direct_covered = direct.covered,
                direct_total = direct.total,
                cross_covered = cross_mapped.covered,
                cross_total = cross_mapped.total,
                "hybrid coverage exceeded its total; clamped"
            );
        }
        tracing::debug!(
            audit_id = %audit,
            framework = %fw.code,
            direct = direct.percentage,
            cross_mapped = cross_mapped.percentage,
            hybrid = hybrid.counts.percentage,
            "framework coverage"
        );

        FrameworkCoverage {
            framework_id: fw.id,
            framework_code: fw.code.clone(),
            framework_name: fw.name.clone(),
            framework_version: fw.version.clone(),
            direct,
            cross_mapped,
            hybrid: hybrid.counts,
            calculated_at,
        }
    }

    /// Stored snapshots of `audit`, newest first. Snapshots of frameworks
    /// no longer in the catalog are skipped.
    pub fn coverage_history(&self, audit: AuditId) -> Vec<CoverageHistoryEntry> {
        self.snapshots
            .history(audit)
            .into_iter()
            .filter_map(|s| {
                let fw = self.catalog.framework(s.framework_id)?;
                Some(CoverageHistoryEntry {
                    calculated_at: s.calculated_at,
                    framework_id: fw.id,
                    framework_code: fw.code,
                    framework_name: fw.name,
                    method: s.method,
                    covered: s.covered,
                    total: s.total,
                    percentage: s.percentage,
                })
            })
            .collect()
    }

    /// Recompute coverage for every active framework and summarize it.
    pub fn coverage_summary(&self, audit: AuditId) -> Result<CoverageSummary, CoverageError> {
        let results = self.coverage(audit, None)?;
        Ok(summarize(audit, &results))
    }

    /// Recompute coverage for each audit and compare per framework.
    pub fn compare_audits(&self, audits: &[AuditId]) -> Result<AuditComparison, CoverageError> {
        let mut per_audit = Vec::with_capacity(audits.len());
        let mut by_code: BTreeMap<String, Vec<f64>> = BTreeMap::new();
        for &audit in audits {
            let frameworks = self.coverage(audit, None)?;
            for fc in &frameworks {
                by_code
                    .entry(fc.framework_code.clone())
                    .or_default()
                    .push(fc.percentage());
            }
            per_audit.push(AuditCoverage {
                audit_id: audit,
                frameworks,
            });
        }

        let frameworks = by_code
            .into_iter()
            .map(|(code, values)| {
                let min = values.iter().copied().fold(f64::INFINITY, f64::min);
                let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
                let avg = round2(values.iter().sum::<f64>() / values.len() as f64);
                (
                    code,
                    FrameworkComparison {
                        min_coverage: min,
                        max_coverage: max,
                        avg_coverage: avg,
                        audits_count: values.len(),
                    },
                )
            })
            .collect();

        Ok(AuditComparison {
            audits_compared: audits.len(),
            audits: per_audit,
            frameworks,
        })
    }
}

/// Summary over already computed results. Ties for best and worst go to
/// the first framework in `results`.
pub fn summarize(audit: AuditId, results: &[FrameworkCoverage]) -> CoverageSummary {
    let percentages: Vec<f64> = results.iter().map(FrameworkCoverage::percentage).collect();
    let average_coverage = if percentages.is_empty() {
        0.0
    } else {
        round2(percentages.iter().sum::<f64>() / percentages.len() as f64)
    };

    let mut best: Option<&FrameworkCoverage> = None;
    let mut worst: Option<&FrameworkCoverage> = None;
    for fc in results {
        if best.map_or(true, |b| fc.percentage() > b.percentage()) {
            best = Some(fc);
        }
        if worst.map_or(true, |w| fc.percentage() < w.percentage()) {
            worst = Some(fc);
        }
    }

    CoverageSummary {
        audit_id: audit,
        total_frameworks: results.len(),
        average_coverage,
        best_framework: best.map(|f| f.framework_code.clone()),
        worst_framework: worst.map(|f| f.framework_code.clone()),
        frameworks_above_80: percentages.iter().filter(|p| **p >= 80.0).count(),
        frameworks_below_50: percentages.iter().filter(|p| **p < 50.0).count(),
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::answers::MemoryAnswerSource;
    use crate::snapshot::MemorySnapshotStore;
    use xref_core::{AnswerFact, MappingCreator, MappingId, MappingType, Requirement, ValidationStatus};
    use xref_engine::{MemoryCatalog, MemoryMappingRepository};

    struct Fixture {
        catalog: MemoryCatalog,
        mappings: MemoryMappingRepository,
        answers: MemoryAnswerSource,
        snapshots: MemorySnapshotStore,
        service: CoverageService,
    }

    fn fixture(config: EngineConfig) -> Fixture {
        let catalog = MemoryCatalog::new();
        let mappings = MemoryMappingRepository::new();
        let answers = MemoryAnswerSource::new();
        let snapshots = MemorySnapshotStore::new();
        let service = CoverageService::new(
            Arc::new(catalog.clone()),
            Arc::new(mappings.clone()),
            Arc::new(answers.clone()),
            Arc::new(snapshots.clone()),
            &config,
        );
        Fixture {
            catalog,
            mappings,
            answers,
            snapshots,
            service,
        }
    }

    fn framework(f: &Fixture, code: &str) -> FrameworkId {
        let fw = Framework::new(code, format!("{code} framework"));
        let id = fw.id;
        f.catalog.insert_framework(fw);
        id
    }

    fn requirement(f: &Fixture, fw: FrameworkId, code: &str) -> RequirementId {
        f.catalog
            .insert_requirement(Requirement::new(fw, code, code, ""))
            .id
    }

    fn approve(f: &Fixture, source: RequirementId, target: RequirementId, s: f64) {
        f.mappings
            .insert(Mapping {
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
            })
            .unwrap();
    }

    fn compliant(f: &Fixture, audit: AuditId, id: RequirementId) {
        f.answers.record(
            audit,
            AnswerFact {
                requirement_id: id,
                compliant: true,
            },
        );
    }

    #[test]
    fn cross_mapped_coverage_through_approved_mapping() {
        let f = fixture(EngineConfig::default());
        let a = framework(&f, "A");
        let b = framework(&f, "B");
        let r1 = requirement(&f, a, "A.1");
        let r2 = requirement(&f, b, "B.1");
        approve(&f, r2, r1, 0.9);
        let audit = AuditId::new();
        compliant(&f, audit, r2);

        let results = f.service.coverage(audit, Some(a)).unwrap();
        assert_eq!(results.len(), 1);
        let a_cov = &results[0];
        assert_eq!(a_cov.direct.percentage, 0.0);
        assert_eq!(a_cov.cross_mapped, CoverageCounts::new(1, 1));
        assert_eq!(a_cov.hybrid.percentage, 100.0);
        assert_eq!(f.snapshots.len(), 3);
    }

    #[test]
    fn audit_without_answers_is_zero() {
        let f = fixture(EngineConfig::default());
        let a = framework(&f, "A");
        requirement(&f, a, "A.1");
        let results = f.service.coverage(AuditId::new(), None).unwrap();
        assert_eq!(results[0].hybrid, CoverageCounts::new(0, 1));
    }

    #[test]
    fn empty_framework_has_zero_percentage() {
        let f = fixture(EngineConfig::default());
        framework(&f, "EMPTY");
        let results = f.service.coverage(AuditId::new(), None).unwrap();
        assert_eq!(results[0].hybrid, CoverageCounts::new(0, 0));
    }

    #[test]
    fn inactive_frameworks_skipped_unless_named() {
        let f = fixture(EngineConfig::default());
        let mut fw = Framework::new("OLD", "Retired");
        fw.is_active = false;
        let id = fw.id;
        f.catalog.insert_framework(fw);
        framework(&f, "NEW");

        let all = f.service.coverage(AuditId::new(), None).unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].framework_code, "NEW");
        assert_eq!(f.service.coverage(AuditId::new(), Some(id)).unwrap().len(), 1);
    }

    #[test]
    fn unknown_framework_is_an_error() {
        let f = fixture(EngineConfig::default());
        let id = FrameworkId::new();
        assert_eq!(
            f.service.coverage(AuditId::new(), Some(id)),
            Err(CoverageError::FrameworkNotFound(id))
        );
    }

    #[test]
    fn recomputation_is_idempotent_and_history_grows() {
        let f = fixture(EngineConfig::default());
        let a = framework(&f, "A");
        let r = requirement(&f, a, "A.1");
        let audit = AuditId::new();
        compliant(&f, audit, r);

        let first = f.service.coverage(audit, None).unwrap();
        let second = f.service.coverage(audit, None).unwrap();
        assert_eq!(first[0].hybrid, second[0].hybrid);

        let history = f.service.coverage_history(audit);
        assert_eq!(history.len(), 6);
        assert!(history
            .windows(2)
            .all(|w| w[0].calculated_at >= w[1].calculated_at));
        assert_eq!(history[0].method, CoverageMethod::Direct);
        assert_eq!(history[2].method, CoverageMethod::Hybrid);
    }

    #[test]
    fn bidirectional_config_lets_target_cover_source() {
        let config = EngineConfig {
            coverage_bidirectional: true,
            ..EngineConfig::default()
        };
        let f = fixture(config);
        let a = framework(&f, "A");
        let b = framework(&f, "B");
        let r1 = requirement(&f, a, "A.1");
        let r2 = requirement(&f, b, "B.1");
        approve(&f, r1, r2, 0.9);
        let audit = AuditId::new();
        compliant(&f, audit, r2);

        let results = f.service.coverage(audit, Some(a)).unwrap();
        assert_eq!(results[0].cross_mapped.covered, 1);
    }

    #[test]
    fn summary_and_comparison() {
        let f = fixture(EngineConfig::default());
        let a = framework(&f, "A");
        let b = framework(&f, "B");
        let a1 = requirement(&f, a, "A.1");
        requirement(&f, a, "A.2");
        let b1 = requirement(&f, b, "B.1");

        let first = AuditId::new();
        compliant(&f, first, a1);
        compliant(&f, first, b1);
        let second = AuditId::new();
        compliant(&f, second, b1);

        let summary = f.service.coverage_summary(first).unwrap();
        assert_eq!(summary.total_frameworks, 2);
        assert_eq!(summary.average_coverage, 75.0);
        assert_eq!(summary.best_framework.as_deref(), Some("B"));
        assert_eq!(summary.worst_framework.as_deref(), Some("A"));
        assert_eq!(summary.frameworks_above_80, 1);
        assert_eq!(summary.frameworks_below_50, 0);

        let cmp = f.service.compare_audits(&[first, second]).unwrap();
        assert_eq!(cmp.audits_compared, 2);
        let a_cmp = &cmp.frameworks["A"];
        assert_eq!(a_cmp.min_coverage, 0.0);
        assert_eq!(a_cmp.max_coverage, 50.0);
        assert_eq!(a_cmp.avg_coverage, 25.0);
        assert_eq!(a_cmp.audits_count, 2);
        assert_eq!(cmp.frameworks["B"].avg_coverage, 100.0);
    }

    #[test]
    fn summary_of_nothing() {
        let summary = summarize(AuditId::new(), &[]);
        assert_eq!(summary.average_coverage, 0.0);
        assert!(summary.best_framework.is_none());
    }
}
