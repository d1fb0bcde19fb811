//! Mapping classification rules.

use xref_core::{MappingType, Requirement, ValidationStatus};

use crate::config::EngineConfig;

/// The mapping type to create for `similarity`, or `None` when the pair is
/// not worth an automated mapping.
///
/// Below `similarity_threshold` nothing is created. The `WeakRelation`
/// tier is reserved for manual records, so it is never returned even when
/// the threshold is configured below its floor.
pub fn classify(similarity: f64, config: &EngineConfig) -> Option<MappingType> {
    if similarity.is_nan() || similarity < config.similarity_threshold {
        return None;
    }
    match MappingType::for_similarity(similarity) {
        MappingType::WeakRelation => None,
        t => Some(t),
    }
}

/// Status of a freshly detected mapping.
pub fn initial_status(similarity: f64, config: &EngineConfig) -> ValidationStatus {
    if similarity >= config.auto_validate_threshold {
        ValidationStatus::Approved
    } else {
        ValidationStatus::Pending
    }
}

/// The source's domain label when both requirements resolve to the same
/// label, compared case-insensitively after trimming.
pub fn shared_domain<'a>(source: &'a Requirement, target: &Requirement) -> Option<&'a str> {
    let a = source.resolved_domain_label()?;
    let b = target.resolved_domain_label()?;
    (a.to_lowercase() == b.to_lowercase()).then_some(a)
}

/// Human-readable justification, e.g.
/// `Semantic similarity: 0.912 | Same domain: Access control`.
pub fn rationale(similarity: f64, shared_domain: Option<&str>) -> String {
    match shared_domain {
        Some(domain) => format!("Semantic similarity: {similarity:.3} | Same domain: {domain}"),
        None => format!("Semantic similarity: {similarity:.3}"),
    }
}
