//! # Embedding Indexing
//!
//! Normalizes, embeds and stores requirement vectors, one framework at a
//! time, and prunes vectors whose requirement has left the catalog.

use std::sync::Arc;

use serde::Serialize;
use xref_core::{normalize_requirement, FrameworkId, Requirement, RequirementId};
use xref_embed::{EmbeddingGenerator, GeneratedVector};
use xref_vector::{EmbeddingRecord, VectorStore};

use crate::batch::{BatchRunner, BatchStats, Changeset, Checkpoint};
use crate::catalog::RequirementCatalog;
use crate::config::EngineConfig;
use crate::error::EngineError;

/// Whether an embedding was produced now or found in the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbeddingOrigin {
    Reused,
    Generated,
}

/// Result of [`EmbeddingIndexer::index_framework`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndexSummary {
    pub framework_id: FrameworkId,
    pub framework_code: String,
    pub total: usize,
    pub generated: usize,
    pub skipped: usize,
    /// Generated vectors that came from the hash fallback.
    pub degraded: usize,
    pub errors: usize,
    pub model: String,
    pub batch: BatchStats,
}

/// Produces and stores requirement embeddings.
#[derive(Clone)]
pub struct EmbeddingIndexer {
    catalog: Arc<dyn RequirementCatalog>,
    vectors: Arc<dyn VectorStore>,
    generator: EmbeddingGenerator,
    config: EngineConfig,
}

impl EmbeddingIndexer {
    pub fn new(
        catalog: Arc<dyn RequirementCatalog>,
        vectors: Arc<dyn VectorStore>,
        generator: EmbeddingGenerator,
        config: EngineConfig,
    ) -> Self {
        Self {
            catalog,
            vectors,
            generator,
            config,
        }
    }

    pub fn generator(&self) -> &EmbeddingGenerator {
        &self.generator
    }

    /// Normalize, embed and upsert one requirement.
    pub fn embed_requirement(
        &self,
        requirement: &Requirement,
    ) -> Result<EmbeddingRecord, EngineError> {
        let text = normalize_requirement(requirement);
        let mut record = match self.generator.generate(&text)? {
            GeneratedVector::Semantic { vector, model } => {
                EmbeddingRecord::new(requirement.id, vector, text, model)
            }
            GeneratedVector::Degraded { vector, .. } => {
                EmbeddingRecord::degraded(requirement.id, vector, text)
            }
        };
        record.active = self.is_active(requirement);
        record.sequence = requirement.sequence;
        self.vectors.upsert(record.clone())?;
        metrics::counter!("xref_embeddings_generated_total").increment(1);
        Ok(record)
    }

    /// The stored embedding of `requirement`, generating it when absent.
    pub fn ensure_embedding(
        &self,
        requirement: &Requirement,
    ) -> Result<(EmbeddingRecord, EmbeddingOrigin), EngineError> {
        match self.vectors.get(requirement.id)? {
            Some(existing) => Ok((existing, EmbeddingOrigin::Reused)),
            None => Ok((self.embed_requirement(requirement)?, EmbeddingOrigin::Generated)),
        }
    }

    /// Embed every requirement of a framework.
    ///
    /// Requirements that already have a vector are skipped unless
    /// `force_regenerate` is set. Item failures are counted in `errors`.
    pub fn index_framework(
        &self,
        framework_id: FrameworkId,
        force_regenerate: bool,
        checkpoint: &mut dyn Checkpoint,
    ) -> Result<IndexSummary, EngineError> {
        let framework = self
            .catalog
            .framework(framework_id)
            .ok_or(EngineError::FrameworkNotFound(framework_id))?;
        let requirements = self.catalog.requirements_of(framework_id);
        tracing::info!(
            framework = %framework.code,
            requirements = requirements.len(),
            force_regenerate,
            "indexing framework embeddings"
        );

        let mut generated = 0;
        let mut skipped = 0;
        let mut degraded = 0;
        let mut runner = BatchRunner::new("index", checkpoint, self.config.checkpoint_every);
        for requirement in &requirements {
            runner.item(requirement.id, |staged: &mut Changeset| {
                if !force_regenerate && self.vectors.contains(requirement.id)? {
                    skipped += 1;
                    return Ok(());
                }
                let record = self.embed_requirement(requirement)?;
                generated += 1;
                if record.degraded {
                    degraded += 1;
                }
                staged.embeddings.push(record);
                Ok(())
            });
        }
        let batch = runner.finish();

        let summary = IndexSummary {
            framework_id,
            framework_code: framework.code,
            total: requirements.len(),
            generated,
            skipped,
            degraded,
            errors: batch.failed + batch.checkpoint_failures,
            model: self.generator.model_id().to_string(),
            batch,
        };
        tracing::info!(
            framework = %summary.framework_code,
            generated = summary.generated,
            skipped = summary.skipped,
            degraded = summary.degraded,
            errors = summary.errors,
            "framework indexing complete"
        );
        Ok(summary)
    }

    /// Delete vectors whose requirement no longer exists in the catalog.
    /// Returns how many were removed.
    pub fn prune_orphans(&self, checkpoint: &mut dyn Checkpoint) -> Result<usize, EngineError> {
        let orphans: Vec<RequirementId> = self
            .vectors
            .requirement_ids()?
            .into_iter()
            .filter(|id| self.catalog.requirement(*id).is_none())
            .collect();

        let mut runner = BatchRunner::new("prune", checkpoint, self.config.checkpoint_every);
        let mut removed = 0;
        for id in orphans {
            runner.item(id, |staged: &mut Changeset| {
                if self.vectors.remove(id)? {
                    removed += 1;
                    staged.removed_embeddings.push(id);
                }
                Ok(())
            });
        }
        runner.finish();
        tracing::info!(removed, "orphan embeddings pruned");
        Ok(removed)
    }

    fn is_active(&self, requirement: &Requirement) -> bool {
        requirement.is_active
            && self
                .catalog
                .framework(requirement.framework_id)
                .is_some_and(|f| f.is_active)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::{CollectingCheckpoint, NoCheckpoint};
    use crate::catalog::MemoryCatalog;
    use xref_core::Framework;
    use xref_embed::{HashingEncoder, UnavailableEncoder};
    use xref_vector::MemoryVectorStore;

    fn setup(encoder_ok: bool) -> (MemoryCatalog, MemoryVectorStore, EmbeddingIndexer, Framework) {
        let catalog = MemoryCatalog::new();
        let vectors = MemoryVectorStore::new();
        let fw = Framework::new("ISO27001", "ISO/IEC 27001");
        catalog.insert_framework(fw.clone());
        for (code, title) in [
            ("A.5.1", "Information security policies"),
            ("A.9.1", "Access control policy"),
        ] {
            catalog.insert_requirement(Requirement::new(fw.id, code, title, ""));
        }
        let generator = if encoder_ok {
            EmbeddingGenerator::new(Arc::new(HashingEncoder::new(32)))
        } else {
            EmbeddingGenerator::new(Arc::new(UnavailableEncoder::new(32)))
        };
        let indexer = EmbeddingIndexer::new(
            Arc::new(catalog.clone()),
            Arc::new(vectors.clone()),
            generator,
            EngineConfig::default(),
        );
        (catalog, vectors, indexer, fw)
    }

    #[test]
    fn indexes_then_skips_existing() {
        let (_, vectors, indexer, fw) = setup(true);
        let mut sink = CollectingCheckpoint::default();
        let first = indexer.index_framework(fw.id, false, &mut sink).unwrap();
        assert_eq!((first.total, first.generated, first.skipped), (2, 2, 0));
        assert_eq!(vectors.len(), 2);
        assert_eq!(sink.commits.len(), 1);
        assert_eq!(sink.commits[0].embeddings.len(), 2);

        let second = indexer.index_framework(fw.id, false, &mut NoCheckpoint).unwrap();
        assert_eq!((second.generated, second.skipped), (0, 2));

        let forced = indexer.index_framework(fw.id, true, &mut NoCheckpoint).unwrap();
        assert_eq!(forced.generated, 2);
        assert_eq!(vectors.len(), 2);
    }

    #[test]
    fn regeneration_is_deterministic() {
        let (catalog, vectors, indexer, fw) = setup(true);
        let req = catalog.requirements_of(fw.id).remove(0);
        let a = indexer.embed_requirement(&req).unwrap();
        let b = indexer.embed_requirement(&req).unwrap();
        assert_eq!(a.vector, b.vector);
        assert_eq!(a.source_text, "[A.5.1]\nInformation security policies");
        assert_eq!(a.sequence, req.sequence);
        assert_eq!(vectors.get(req.id).unwrap().unwrap().vector, a.vector);
    }

    #[test]
    fn degraded_vectors_are_counted() {
        let (_, vectors, indexer, fw) = setup(false);
        let summary = indexer.index_framework(fw.id, false, &mut NoCheckpoint).unwrap();
        assert_eq!(summary.degraded, 2);
        assert_eq!(summary.errors, 0);
        assert!(vectors.records().iter().all(|r| r.degraded));
    }

    #[test]
    fn unavailable_store_counts_errors() {
        let (_, vectors, indexer, fw) = setup(true);
        vectors.set_available(false);
        let summary = indexer.index_framework(fw.id, false, &mut NoCheckpoint).unwrap();
        assert_eq!(summary.errors, 2);
        assert_eq!(summary.generated, 0);
    }

    #[test]
    fn unknown_framework_is_not_found() {
        let (_, _, indexer, _) = setup(true);
        assert!(matches!(
            indexer.index_framework(FrameworkId::new(), false, &mut NoCheckpoint),
            Err(EngineError::FrameworkNotFound(_))
        ));
    }

    #[test]
    fn prunes_orphans() {
        let (catalog, vectors, indexer, fw) = setup(true);
        indexer.index_framework(fw.id, false, &mut NoCheckpoint).unwrap();
        let gone = catalog.requirements_of(fw.id).remove(0);
        catalog.remove_requirement(gone.id);
        let mut sink = CollectingCheckpoint::default();
        assert_eq!(indexer.prune_orphans(&mut sink).unwrap(), 1);
        assert_eq!(vectors.len(), 1);
        assert_eq!(sink.commits[0].removed_embeddings, vec![gone.id]);
        assert_eq!(indexer.prune_orphans(&mut NoCheckpoint).unwrap(), 0);
    }
}
