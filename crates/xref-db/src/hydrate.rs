//! Startup hydration of the in-memory stores.

use sqlx::PgPool;
use xref_coverage::{MemoryAnswerSource, MemorySnapshotStore, SnapshotStore};
use xref_engine::{MappingRepository, MemoryCatalog, MemoryMappingRepository};
use xref_vector::{MemoryVectorStore, VectorStore};

use crate::{answers, embeddings, frameworks, mappings, requirements, snapshots};

/// Rows loaded into each store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HydrationReport {
    pub frameworks: usize,
    pub requirements: usize,
    pub embeddings: usize,
    pub mappings: usize,
    pub answers: usize,
    pub snapshots: usize,
    /// Rows rejected by a store (dimension or self-mapping conflicts).
    pub skipped: usize,
}

/// Load every table into the given stores.
pub async fn hydrate(
    pool: &PgPool,
    catalog: &MemoryCatalog,
    vectors: &MemoryVectorStore,
    mapping_repo: &MemoryMappingRepository,
    answer_source: &MemoryAnswerSource,
    snapshot_store: &MemorySnapshotStore,
) -> Result<HydrationReport, sqlx::Error> {
    let mut report = HydrationReport::default();

    for fw in frameworks::load_all(pool).await? {
        catalog.insert_framework(fw);
        report.frameworks += 1;
    }
    for r in requirements::load_all(pool).await? {
        catalog.insert_requirement(r);
        report.requirements += 1;
    }

    for record in embeddings::load_all(pool).await? {
        let id = record.requirement_id;
        match vectors.upsert(record) {
            Ok(()) => report.embeddings += 1,
            Err(e) => {
                tracing::warn!(requirement_id = %id, error = %e, "skipping stored embedding");
                report.skipped += 1;
            }
        }
    }

    for m in mappings::load_all(pool).await? {
        let id = m.id;
        match mapping_repo.insert(m) {
            Ok(()) => report.mappings += 1,
            Err(e) => {
                tracing::warn!(mapping_id = %id, error = %e, "skipping stored mapping");
                report.skipped += 1;
            }
        }
    }

    for (audit, fact) in answers::load_all(pool).await? {
        answer_source.record(audit, fact);
        report.answers += 1;
    }

    for batch in snapshots::load_all(pool).await? {
        match snapshot_store.record(&batch) {
            Ok(()) => report.snapshots += batch.len(),
            Err(e) => {
                tracing::warn!(error = %e, "skipping stored coverage snapshots");
                report.skipped += batch.len();
            }
        }
    }

    tracing::info!(
        frameworks = report.frameworks,
        requirements = report.requirements,
        embeddings = report.embeddings,
        mappings = report.mappings,
        answers = report.answers,
        snapshots = report.snapshots,
        skipped = report.skipped,
        "stores hydrated from PostgreSQL"
    );
    Ok(report)
}
