//! # Mapping Detector
//!
//! For every requirement of a framework `F`:
//!
//! 1. Reuse its stored embedding, or normalize and embed it.
//! 2. Query the `top_n` nearest active requirements.
//! 3. Drop itself, requirements of `F`, and candidates below
//!    `similarity_threshold`.
//! 4. Classify the survivors, flag shared domains, write a rationale.
//! 5. De-duplicate by unordered pair, against this run and against stored
//!    mappings, keeping the higher similarity.
//! 6. Store: approved when at or above `auto_validate_threshold`, else
//!    pending.
//!
//! Similarities involving a hash-fallback vector are never turned into
//! mappings. When the vector index is unavailable the detector falls back
//! to keyword matching, whose 0.0 similarities cannot pass the threshold;
//! the run reports a warning instead of failing.

use std::sync::Arc;

use serde::Serialize;
use xref_core::{
    FrameworkId, Mapping, MappingCreator, MappingId, Requirement, RequirementId, Timestamp,
    ValidationStatus,
};
use xref_vector::{keyword_matches, RequirementMatch, VectorStore, VectorStoreError};

use crate::batch::{BatchRunner, Changeset, Checkpoint};
use crate::catalog::RequirementCatalog;
use crate::classify::{classify, initial_status, rationale, shared_domain};
use crate::config::EngineConfig;
use crate::dedupe::dedupe_candidates;
use crate::error::EngineError;
use crate::indexing::{EmbeddingIndexer, EmbeddingOrigin};
use crate::repository::MappingRepository;

/// Per-run options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DetectOptions {
    /// Delete the framework's prior mappings (as source) and re-embed its
    /// requirements before detecting.
    pub force_regenerate: bool,
}

/// Outcome of a detection run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DetectionSummary {
    pub framework_id: FrameworkId,
    pub framework_code: String,
    pub total_requirements_analyzed: usize,
    pub embeddings_generated: usize,
    pub embeddings_reused: usize,
    pub mappings_created: usize,
    /// Stored pending mappings re-scored by a stronger candidate.
    pub mappings_updated: usize,
    pub auto_approved: usize,
    pub pending: usize,
    pub duplicates_merged: usize,
    /// Mappings deleted up front by `force_regenerate`.
    pub prior_mappings_removed: usize,
    pub keyword_fallbacks: usize,
    pub errors: usize,
    pub warnings: usize,
    /// Whether any requirement went through a degraded path.
    pub degraded: bool,
    pub similarity_threshold: f64,
    pub auto_validate_threshold: f64,
}

/// What one requirement contributed to the run.
#[derive(Debug, Default)]
struct ItemReport {
    generated: bool,
    created: Vec<Mapping>,
    updated: usize,
    merged: usize,
    keyword_fallback: bool,
    warning: bool,
}

/// Detects cross-framework mappings for a framework.
#[derive(Clone)]
pub struct MappingDetector {
    catalog: Arc<dyn RequirementCatalog>,
    vectors: Arc<dyn VectorStore>,
    mappings: Arc<dyn MappingRepository>,
    indexer: EmbeddingIndexer,
    config: EngineConfig,
}

impl MappingDetector {
    pub fn new(
        catalog: Arc<dyn RequirementCatalog>,
        vectors: Arc<dyn VectorStore>,
        mappings: Arc<dyn MappingRepository>,
        indexer: EmbeddingIndexer,
        config: EngineConfig,
    ) -> Self {
        Self {
            catalog,
            vectors,
            mappings,
            indexer,
            config,
        }
    }

    /// Run detection for `framework_id`.
    ///
    /// # Errors
    ///
    /// Only [`EngineError::FrameworkNotFound`]. Per-requirement failures
    /// are counted in the summary.
    pub fn detect(
        &self,
        framework_id: FrameworkId,
        options: DetectOptions,
        checkpoint: &mut dyn Checkpoint,
    ) -> Result<DetectionSummary, EngineError> {
        let framework = self
            .catalog
            .framework(framework_id)
            .ok_or(EngineError::FrameworkNotFound(framework_id))?;
        let requirements = self.catalog.requirements_of(framework_id);

        let mut summary = DetectionSummary {
            framework_id,
            framework_code: framework.code.clone(),
            total_requirements_analyzed: requirements.len(),
            similarity_threshold: self.config.similarity_threshold,
            auto_validate_threshold: self.config.auto_validate_threshold,
            ..DetectionSummary::default()
        };
        tracing::info!(
            framework = %framework.code,
            requirements = requirements.len(),
            force_regenerate = options.force_regenerate,
            "detecting cross-framework mappings"
        );

        let mut runner = BatchRunner::new("detect", checkpoint, self.config.checkpoint_every);

        if options.force_regenerate {
            let catalog = &self.catalog;
            let removed = self.mappings.remove_where(&|m| {
                catalog.framework_of(m.source_requirement_id) == Some(framework_id)
            });
            summary.prior_mappings_removed = removed.len();
            runner.stage(Changeset {
                removed_mappings: removed.iter().map(|m| m.id).collect(),
                ..Changeset::default()
            });
        }

        for requirement in &requirements {
            let report = runner.item(requirement.id, |staged| {
                self.detect_for(requirement, options, staged)
            });
            let Some(report) = report else { continue };

            if report.generated {
                summary.embeddings_generated += 1;
            } else {
                summary.embeddings_reused += 1;
            }
            for m in &report.created {
                match m.validation_status {
                    ValidationStatus::Approved => summary.auto_approved += 1,
                    _ => summary.pending += 1,
                }
            }
            summary.mappings_created += report.created.len();
            summary.mappings_updated += report.updated;
            summary.duplicates_merged += report.merged;
            if report.keyword_fallback {
                summary.keyword_fallbacks += 1;
            }
            if report.warning {
                summary.warnings += 1;
                summary.degraded = true;
            }
        }

        let batch = runner.finish();
        summary.errors = batch.failed + batch.checkpoint_failures;
        metrics::counter!("xref_mappings_created_total").increment(summary.mappings_created as u64);

        tracing::info!(
            framework = %summary.framework_code,
            analyzed = summary.total_requirements_analyzed,
            created = summary.mappings_created,
            auto_approved = summary.auto_approved,
            pending = summary.pending,
            merged = summary.duplicates_merged,
            errors = summary.errors,
            warnings = summary.warnings,
            "mapping detection complete"
        );
        Ok(summary)
    }

    fn detect_for(
        &self,
        requirement: &Requirement,
        options: DetectOptions,
        staged: &mut Changeset,
    ) -> Result<ItemReport, EngineError> {
        let mut report = ItemReport::default();

        let matches = match self.semantic_matches(requirement, options, staged, &mut report) {
            Ok(matches) => matches,
            Err(EngineError::VectorStore(VectorStoreError::Unavailable { reason })) => {
                tracing::warn!(
                    requirement_id = %requirement.id,
                    reason = %reason,
                    "vector store unavailable; falling back to keyword matching"
                );
                metrics::counter!("xref_keyword_fallbacks_total").increment(1);
                report.keyword_fallback = true;
                report.warning = true;
                self.keyword_candidates(requirement)
            }
            Err(e) => return Err(e),
        };

        let now = Timestamp::now();
        let mut candidates = Vec::new();
        for m in matches {
            if m.requirement_id == requirement.id {
                continue;
            }
            let Some(target) = self.catalog.requirement(m.requirement_id) else {
                continue;
            };
            if target.framework_id == requirement.framework_id {
                continue;
            }
            let Some(mapping_type) = classify(m.similarity, &self.config) else {
                continue;
            };
            let domain = shared_domain(requirement, &target);
            candidates.push(Mapping {
                id: MappingId::new(),
                source_requirement_id: requirement.id,
                target_requirement_id: target.id,
                mapping_type,
                semantic_similarity: m.similarity,
                confidence: m.similarity,
                domain_match: domain.is_some(),
                rationale: Some(rationale(m.similarity, domain)),
                created_by: MappingCreator::Automated,
                validation_status: initial_status(m.similarity, &self.config),
                validated_by: None,
                validated_at: None,
                created_at: now,
            });
        }

        let (candidates, local_dupes) = dedupe_candidates(candidates);
        let outcome = self.mappings.merge(candidates)?;
        report.merged = local_dupes + outcome.merged;
        report.updated = outcome.updated.len();
        staged.mappings.extend(outcome.created.iter().cloned());
        staged.mappings.extend(outcome.updated);
        report.created = outcome.created;
        Ok(report)
    }

    /// Nearest neighbours of `requirement` that are backed by genuine
    /// semantic vectors.
    fn semantic_matches(
        &self,
        requirement: &Requirement,
        options: DetectOptions,
        staged: &mut Changeset,
        report: &mut ItemReport,
    ) -> Result<Vec<RequirementMatch>, EngineError> {
        let (record, origin) = if options.force_regenerate {
            (
                self.indexer.embed_requirement(requirement)?,
                EmbeddingOrigin::Generated,
            )
        } else {
            self.indexer.ensure_embedding(requirement)?
        };
        if origin == EmbeddingOrigin::Generated {
            report.generated = true;
            staged.embeddings.push(record.clone());
        }

        if record.degraded {
            tracing::warn!(
                requirement_id = %requirement.id,
                "requirement has a fallback embedding; skipping similarity search"
            );
            report.warning = true;
            return Ok(Vec::new());
        }

        let neighbors = self.vectors.nearest(&record.vector, self.config.top_n, true)?;
        let mut matches = Vec::with_capacity(neighbors.len());
        for neighbor in neighbors {
            let genuine = self
                .vectors
                .get(neighbor.requirement_id)?
                .is_some_and(|r| !r.degraded);
            if genuine {
                matches.push(RequirementMatch::from(neighbor));
            }
        }
        Ok(matches)
    }

    fn keyword_candidates(&self, requirement: &Requirement) -> Vec<RequirementMatch> {
        let others: Vec<Requirement> = self
            .catalog
            .active_frameworks()
            .into_iter()
            .filter(|f| f.id != requirement.framework_id)
            .flat_map(|f| self.catalog.requirements_of(f.id))
            .filter(|r| r.is_active)
            .collect();
        let texts: Vec<(RequirementId, String)> = others
            .iter()
            .map(|r| (r.id, format!("{} {}", r.title, r.body)))
            .collect();
        let query = format!("{} {}", requirement.title, requirement.body);
        keyword_matches(
            &query,
            texts.iter().map(|(id, t)| (*id, t.as_str())),
            self.config.top_n,
        )
    }
}
