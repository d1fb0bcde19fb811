//! # Validation Workflow
//!
//! Review decisions over detected mappings:
//! - a later decision overrides an earlier one on the same row
//! - approval makes a mapping count toward coverage, rejection removes it
//! - curated mappings replace the detected row for their pair

use std::sync::Arc;

use xref_core::{
    AnswerFact, AuditId, Framework, MappingCreator, MappingType, Requirement, ValidationStatus,
    ValidatorId,
};
use xref_coverage::{CoverageService, MemoryAnswerSource, MemorySnapshotStore};
use xref_embed::{EmbeddingGenerator, HashingEncoder};
use xref_engine::{
    DetectOptions, EmbeddingIndexer, EngineConfig, MappingDetector, MappingRepository,
    MemoryCatalog, MemoryMappingRepository, NoCheckpoint, ValidationWorkflow,
};
use xref_vector::{EmbeddingRecord, MemoryVectorStore, VectorStore};

struct World {
    catalog: MemoryCatalog,
    vectors: MemoryVectorStore,
    mappings: MemoryMappingRepository,
    answers: MemoryAnswerSource,
    detector: MappingDetector,
    workflow: ValidationWorkflow,
    coverage: CoverageService,
}

fn world() -> World {
    let catalog = MemoryCatalog::new();
    let vectors = MemoryVectorStore::new();
    let mappings = MemoryMappingRepository::new();
    let answers = MemoryAnswerSource::new();
    let config = EngineConfig::default();
    let indexer = EmbeddingIndexer::new(
        Arc::new(catalog.clone()),
        Arc::new(vectors.clone()),
        EmbeddingGenerator::new(Arc::new(HashingEncoder::new(3))),
        config.clone(),
    );
    let detector = MappingDetector::new(
        Arc::new(catalog.clone()),
        Arc::new(vectors.clone()),
        Arc::new(mappings.clone()),
        indexer,
        config.clone(),
    );
    let workflow =
        ValidationWorkflow::new(Arc::new(catalog.clone()), Arc::new(mappings.clone()), config.clone());
    let coverage = CoverageService::new(
        Arc::new(catalog.clone()),
        Arc::new(mappings.clone()),
        Arc::new(answers.clone()),
        Arc::new(MemorySnapshotStore::new()),
        &config,
    );
    World {
        catalog,
        vectors,
        mappings,
        answers,
        detector,
        workflow,
        coverage,
    }
}

/// Two frameworks with one requirement each at similarity 0.9, detected
/// and left pending.
fn detected_pair(w: &World) -> (Framework, Requirement, Requirement) {
    let iso = Framework::new("ISO27001", "ISO/IEC 27001");
    let nis = Framework::new("NIS2", "NIS 2 Directive");
    w.catalog.insert_framework(iso.clone());
    w.catalog.insert_framework(nis.clone());
    let a = w
        .catalog
        .insert_requirement(Requirement::new(iso.id, "A.5.24", "Incident planning", ""));
    let b = w
        .catalog
        .insert_requirement(Requirement::new(nis.id, "23.1", "Incident notification", ""));
    // L2 distance 0.1 between unit vectors.
    let cos = 1.0f32 - 0.01 / 2.0;
    let sin = (1.0 - cos * cos).sqrt();
    w.vectors
        .upsert(EmbeddingRecord::new(a.id, vec![1.0, 0.0, 0.0], "a", "planted"))
        .unwrap();
    w.vectors
        .upsert(EmbeddingRecord::new(b.id, vec![cos, sin, 0.0], "b", "planted"))
        .unwrap();
    w.detector
        .detect(iso.id, DetectOptions::default(), &mut NoCheckpoint)
        .unwrap();
    (iso, a, b)
}

#[test]
fn approve_then_reject_leaves_one_rejected_row() {
    let w = world();
    let (_, a, b) = detected_pair(&w);
    let mapping = w.mappings.find_pair(a.id, b.id).unwrap();
    assert_eq!(mapping.validation_status, ValidationStatus::Pending);

    let first = ValidatorId::new();
    let second = ValidatorId::new();
    w.workflow
        .validate(mapping.id, first, true, Some("same obligation".into()))
        .unwrap();
    let rejected = w
        .workflow
        .validate(mapping.id, second, false, None)
        .unwrap();

    assert_eq!(rejected.validation_status, ValidationStatus::Rejected);
    assert_eq!(rejected.validated_by, Some(second));
    assert!(rejected.validated_at.is_some());
    assert_eq!(rejected.rationale.as_deref(), Some("same obligation"));
    assert_eq!(w.mappings.len(), 1);
    assert_eq!(w.mappings.get(mapping.id).unwrap(), rejected);
}

#[test]
fn decisions_drive_cross_mapped_coverage() {
    let w = world();
    let (_, a, b) = detected_pair(&w);
    let mapping = w.mappings.find_pair(a.id, b.id).unwrap();
    let audit = AuditId::new();
    w.answers.record(
        audit,
        AnswerFact {
            requirement_id: a.id,
            compliant: true,
        },
    );
    let nis = b.framework_id;
    let cross = |w: &World| w.coverage.coverage(audit, Some(nis)).unwrap()[0].cross_mapped;

    assert_eq!(cross(&w).covered, 0);
    w.workflow
        .validate(mapping.id, ValidatorId::new(), true, None)
        .unwrap();
    assert_eq!(cross(&w).covered, 1);
    w.workflow
        .validate(mapping.id, ValidatorId::new(), false, None)
        .unwrap();
    assert_eq!(cross(&w).covered, 0);
}

#[test]
fn curated_mapping_replaces_detected_row() {
    let w = world();
    let (iso, a, b) = detected_pair(&w);
    let detected = w.mappings.find_pair(a.id, b.id).unwrap();
    assert_eq!(w.workflow.pending_mappings(Some(iso.id), None).len(), 1);

    let curated = w
        .workflow
        .record_manual_mapping(
            b.id,
            a.id,
            MappingType::Equivalent,
            ValidatorId::new(),
            Some("reviewed by the ISMS team".into()),
        )
        .unwrap();

    assert_eq!(w.mappings.len(), 1);
    assert!(w.mappings.get(detected.id).is_none());
    assert_eq!(curated.created_by, MappingCreator::Human);
    assert_eq!(curated.validation_status, ValidationStatus::Approved);
    assert_eq!(curated.semantic_similarity, detected.semantic_similarity);
    assert!(w.workflow.pending_mappings(None, None).is_empty());

    let stats = w.workflow.mapping_statistics(None);
    assert_eq!(stats.total_mappings, 1);
    assert_eq!(stats.approval_rate, 100.0);
}
