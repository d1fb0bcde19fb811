//! Embedding persistence operations.
//!
//! Functions take any Postgres executor so that [`crate::PgCheckpoint`]
//! can run them inside one transaction.

use chrono::{DateTime, Utc};
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;
use xref_core::{RequirementId, Timestamp};
use xref_vector::EmbeddingRecord;

/// Insert or replace the embedding of a requirement.
pub async fn upsert<'e>(
    executor: impl PgExecutor<'e>,
    record: &EmbeddingRecord,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO requirement_embeddings
            (requirement_id, vector, source_text, model, degraded, active, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7)
         ON CONFLICT (requirement_id) DO UPDATE SET
            vector = EXCLUDED.vector,
            source_text = EXCLUDED.source_text,
            model = EXCLUDED.model,
            degraded = EXCLUDED.degraded,
            active = EXCLUDED.active,
            updated_at = EXCLUDED.updated_at",
    )
    .bind(record.requirement_id.as_uuid())
    .bind(&record.vector)
    .bind(&record.source_text)
    .bind(&record.model)
    .bind(record.degraded)
    .bind(record.active)
    .bind(record.updated_at.into_datetime())
    .execute(executor)
    .await?;
    Ok(())
}

/// Delete the embedding of a requirement. Returns whether a row existed.
pub async fn delete<'e>(
    executor: impl PgExecutor<'e>,
    requirement_id: RequirementId,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM requirement_embeddings WHERE requirement_id = $1")
        .bind(requirement_id.as_uuid())
        .execute(executor)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Load all embeddings for hydration, in catalog order. Each record takes
/// its requirement's sequence so neighbour ties survive a restart.
pub async fn load_all(pool: &PgPool) -> Result<Vec<EmbeddingRecord>, sqlx::Error> {
    let rows = sqlx::query_as::<_, EmbeddingRow>(
        "SELECT e.requirement_id, e.vector, e.source_text, e.model, e.degraded, e.active,
                e.updated_at, COALESCE(r.sequence, 0) AS sequence
         FROM requirement_embeddings e
         LEFT JOIN requirements r ON r.id = e.requirement_id
         ORDER BY sequence, e.requirement_id",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(EmbeddingRow::into_record).collect())
}

#[derive(sqlx::FromRow)]
struct EmbeddingRow {
    requirement_id: Uuid,
    vector: Vec<f32>,
    source_text: String,
    model: String,
    degraded: bool,
    active: bool,
    updated_at: DateTime<Utc>,
    sequence: i64,
}

impl EmbeddingRow {
    fn into_record(self) -> EmbeddingRecord {
        EmbeddingRecord {
            requirement_id: RequirementId::from_uuid(self.requirement_id),
            vector: self.vector,
            source_text: self.source_text,
            model: self.model,
            degraded: self.degraded,
            active: self.active,
            sequence: u64::try_from(self.sequence).unwrap_or(0),
            updated_at: Timestamp::from_utc(self.updated_at),
        }
    }
}
