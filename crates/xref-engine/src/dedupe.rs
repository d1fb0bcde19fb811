//! Symmetric pair de-duplication.
//!
//! A mapping between `a` and `b` is the same relationship as one between
//! `b` and `a`. [`PairKey`] normalizes the pair so both directions hash
//! identically.

use std::collections::HashMap;

use xref_core::{Mapping, RequirementId};

/// Unordered requirement pair, stored as `(min, max)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PairKey(RequirementId, RequirementId);

impl PairKey {
    pub fn new(a: RequirementId, b: RequirementId) -> Self {
        if a <= b {
            Self(a, b)
        } else {
            Self(b, a)
        }
    }

    pub fn of(mapping: &Mapping) -> Self {
        Self::new(mapping.source_requirement_id, mapping.target_requirement_id)
    }

    pub fn low(&self) -> RequirementId {
        self.0
    }

    pub fn high(&self) -> RequirementId {
        self.1
    }
}

/// Collapse candidates sharing an unordered pair, keeping the one with
/// the higher similarity (the earlier one on ties). First-seen order is
/// preserved. Returns the survivors and the number of dropped duplicates.
pub fn dedupe_candidates(candidates: Vec<Mapping>) -> (Vec<Mapping>, usize) {
    let mut slots: HashMap<PairKey, usize> = HashMap::new();
    let mut kept: Vec<Mapping> = Vec::with_capacity(candidates.len());
    let mut dropped = 0;

    for candidate in candidates {
        match slots.get(&PairKey::of(&candidate)) {
            Some(&idx) => {
                dropped += 1;
                if candidate.semantic_similarity > kept[idx].semantic_similarity {
                    kept[idx] = candidate;
                }
            }
            None => {
                slots.insert(PairKey::of(&candidate), kept.len());
                kept.push(candidate);
            }
        }
    }
    (kept, dropped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use xref_core::{MappingCreator, MappingId, MappingType, Timestamp, ValidationStatus};

    fn mapping(a: RequirementId, b: RequirementId, s: f64) -> Mapping {
        Mapping {
            id: MappingId::new(),
            source_requirement_id: a,
            target_requirement_id: b,
            mapping_type: MappingType::for_similarity(s),
            semantic_similarity: s,
            confidence: s,
            domain_match: false,
            rationale: None,
            created_by: MappingCreator::Automated,
            validation_status: ValidationStatus::Pending,
            validated_by: None,
            validated_at: None,
            created_at: Timestamp::now(),
        }
    }

    #[test]
    fn pair_key_is_symmetric() {
        let a = RequirementId::new();
        let b = RequirementId::new();
        assert_eq!(PairKey::new(a, b), PairKey::new(b, a));
        let k = PairKey::new(a, b);
        assert!(k.low() <= k.high());
    }

    #[test]
    fn reverse_duplicate_keeps_higher_similarity() {
        let a = RequirementId::new();
        let b = RequirementId::new();
        let c = RequirementId::new();
        let (kept, dropped) = dedupe_candidates(vec![
            mapping(a, b, 0.80),
            mapping(a, c, 0.90),
            mapping(b, a, 0.88),
        ]);
        assert_eq!(dropped, 1);
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].source_requirement_id, b);
        assert_eq!(kept[0].semantic_similarity, 0.88);
        assert_eq!(kept[1].target_requirement_id, c);
    }

    #[test]
    fn ties_keep_first() {
        let a = RequirementId::new();
        let b = RequirementId::new();
        let first = mapping(a, b, 0.9);
        let first_id = first.id;
        let (kept, _) = dedupe_candidates(vec![first, mapping(b, a, 0.9)]);
        assert_eq!(kept[0].id, first_id);
    }
}
