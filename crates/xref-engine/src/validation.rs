//! # Validation Workflow
//!
//! Human review over detected mappings.
//!
//! ## States
//!
//! ```text
//! Pending ──▶ Approved
//!    │           ▲ │
//!    │           │ ▼
//!    └──────▶ Rejected
//! ```
//!
//! Every decision stamps the validator and time and may replace the
//! rationale. A decided mapping can be decided again; the latest decision
//! wins. The only automatic transition is auto-approval at creation time.

use std::sync::Arc;

use serde::Serialize;
use xref_core::{
    FrameworkId, Mapping, MappingCreator, MappingId, MappingType, Requirement, RequirementId,
    Timestamp, ValidationStatus, ValidatorId,
};

use crate::catalog::RequirementCatalog;
use crate::config::EngineConfig;
use crate::error::{EngineError, ValidationStateError};
use crate::repository::MappingRepository;

/// A reviewer's decision on one mapping.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationDecision {
    pub validator: ValidatorId,
    pub approved: bool,
    /// Replaces the stored rationale when present and not blank.
    pub rationale: Option<String>,
}

/// Record of an applied decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ValidationTransition {
    pub mapping_id: MappingId,
    pub from: ValidationStatus,
    pub to: ValidationStatus,
    pub validator: ValidatorId,
    pub at: Timestamp,
}

/// Apply `decision` to `mapping` at time `at`.
pub fn apply_decision(
    mapping: &mut Mapping,
    decision: &ValidationDecision,
    at: Timestamp,
) -> ValidationTransition {
    let from = mapping.validation_status;
    let to = if decision.approved {
        ValidationStatus::Approved
    } else {
        ValidationStatus::Rejected
    };
    mapping.validation_status = to;
    mapping.validated_by = Some(decision.validator);
    mapping.validated_at = Some(at);
    if let Some(text) = decision.rationale.as_deref().map(str::trim) {
        if !text.is_empty() {
            mapping.rationale = Some(text.to_string());
        }
    }
    ValidationTransition {
        mapping_id: mapping.id,
        from,
        to,
        validator: decision.validator,
        at,
    }
}

/// One side of a mapping, as shown to reviewers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequirementSummary {
    pub requirement_id: RequirementId,
    pub official_code: String,
    pub title: String,
    pub framework_id: FrameworkId,
    pub framework_code: String,
    pub framework_name: String,
}

/// A mapping awaiting review.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PendingMapping {
    pub mapping_id: MappingId,
    pub mapping_type: MappingType,
    pub semantic_similarity: f64,
    pub confidence: f64,
    pub rationale: Option<String>,
    pub created_at: Timestamp,
    pub source: RequirementSummary,
    pub target: RequirementSummary,
}

/// Review operations over the mapping repository.
#[derive(Clone)]
pub struct ValidationWorkflow {
    pub(crate) catalog: Arc<dyn RequirementCatalog>,
    pub(crate) mappings: Arc<dyn MappingRepository>,
    pub(crate) config: EngineConfig,
}

impl ValidationWorkflow {
    pub fn new(
        catalog: Arc<dyn RequirementCatalog>,
        mappings: Arc<dyn MappingRepository>,
        config: EngineConfig,
    ) -> Self {
        Self {
            catalog,
            mappings,
            config,
        }
    }

    /// Approve or reject a mapping.
    ///
    /// # Errors
    ///
    /// [`ValidationStateError::NotFound`] for an unknown id.
    pub fn validate(
        &self,
        mapping_id: MappingId,
        validator: ValidatorId,
        approved: bool,
        rationale: Option<String>,
    ) -> Result<Mapping, ValidationStateError> {
        let decision = ValidationDecision {
            validator,
            approved,
            rationale,
        };
        let at = Timestamp::now();
        let mut transition = None;
        let updated = self
            .mappings
            .update(mapping_id, &mut |m| {
                transition = Some(apply_decision(m, &decision, at));
            })
            .ok_or(ValidationStateError::NotFound(mapping_id))?;

        if let Some(t) = transition {
            if t.from.is_decided() && t.from != t.to {
                tracing::info!(
                    mapping_id = %mapping_id,
                    from = %t.from,
                    to = %t.to,
                    validator = %validator,
                    "mapping decision overridden"
                );
            } else {
                tracing::info!(
                    mapping_id = %mapping_id,
                    status = %t.to,
                    validator = %validator,
                    "mapping validated"
                );
            }
        }
        Ok(updated)
    }

    /// Pending mappings, highest similarity first.
    ///
    /// With `framework`, only mappings with either side in that framework.
    /// `limit` defaults to the configured `pending_limit`.
    pub fn pending_mappings(
        &self,
        framework: Option<FrameworkId>,
        limit: Option<usize>,
    ) -> Vec<PendingMapping> {
        let limit = limit.unwrap_or(self.config.pending_limit);
        let mut pending: Vec<PendingMapping> = self
            .mappings
            .list()
            .into_iter()
            .filter(|m| m.validation_status == ValidationStatus::Pending)
            .filter_map(|m| {
                let source = self.summarize(m.source_requirement_id)?;
                let target = self.summarize(m.target_requirement_id)?;
                if let Some(fw) = framework {
                    if source.framework_id != fw && target.framework_id != fw {
                        return None;
                    }
                }
                Some(PendingMapping {
                    mapping_id: m.id,
                    mapping_type: m.mapping_type,
                    semantic_similarity: m.semantic_similarity,
                    confidence: m.confidence,
                    rationale: m.rationale,
                    created_at: m.created_at,
                    source,
                    target,
                })
            })
            .collect();
        pending.sort_by(|a, b| b.semantic_similarity.total_cmp(&a.semantic_similarity));
        pending.truncate(limit);
        pending
    }

    /// Record a mapping curated by a reviewer. It is created approved,
    /// stamped with the reviewer, and replaces any mapping for the pair.
    pub fn record_manual_mapping(
        &self,
        source: RequirementId,
        target: RequirementId,
        mapping_type: MappingType,
        validator: ValidatorId,
        rationale: Option<String>,
    ) -> Result<Mapping, EngineError> {
        let src = self.require(source)?;
        let tgt = self.require(target)?;
        if src.framework_id == tgt.framework_id {
            return Err(EngineError::SameFramework {
                source_id: source,
                target_id: target,
            });
        }
        let now = Timestamp::now();
        let similarity = self
            .mappings
            .find_pair(source, target)
            .map_or(0.0, |m| m.semantic_similarity);
        let mapping = Mapping {
            id: MappingId::new(),
            source_requirement_id: source,
            target_requirement_id: target,
            mapping_type,
            semantic_similarity: similarity,
            confidence: 1.0,
            domain_match: crate::classify::shared_domain(&src, &tgt).is_some(),
            rationale: rationale.filter(|r| !r.trim().is_empty()),
            created_by: MappingCreator::Human,
            validation_status: ValidationStatus::Approved,
            validated_by: Some(validator),
            validated_at: Some(now),
            created_at: now,
        };
        self.mappings.insert(mapping.clone())?;
        tracing::info!(
            mapping_id = %mapping.id,
            mapping_type = %mapping_type,
            validator = %validator,
            "manual mapping recorded"
        );
        Ok(mapping)
    }

    fn require(&self, id: RequirementId) -> Result<Requirement, EngineError> {
        self.catalog
            .requirement(id)
            .ok_or(EngineError::RequirementNotFound(id))
    }

    pub(crate) fn summarize(&self, id: RequirementId) -> Option<RequirementSummary> {
        let r = self.catalog.requirement(id)?;
        let fw = self.catalog.framework(r.framework_id)?;
        Some(RequirementSummary {
            requirement_id: r.id,
            official_code: r.official_code,
            title: r.title,
            framework_id: fw.id,
            framework_code: fw.code,
            framework_name: fw.name,
        })
    }
}
