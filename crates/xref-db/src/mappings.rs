//! Mapping persistence operations.
//!
//! The unordered-pair unique index is the database's copy of the
//! repository invariant. Writing a mapping first removes any other row for
//! the same pair, so a replaced record never collides with its successor.

use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;
use xref_core::{
    Mapping, MappingCreator, MappingId, MappingType, RequirementId, Timestamp, ValidationStatus,
    ValidatorId,
};

use crate::parse_column;

/// Write one mapping (insert or update by id) in its own transaction.
pub async fn save(pool: &PgPool, mapping: &Mapping) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;
    upsert(&mut tx, mapping).await?;
    tx.commit().await
}

/// Insert or update a mapping on an open connection.
pub async fn upsert(conn: &mut PgConnection, mapping: &Mapping) -> Result<(), sqlx::Error> {
    sqlx::query(
        "DELETE FROM requirement_mappings
         WHERE LEAST(source_requirement_id, target_requirement_id) = LEAST($1::uuid, $2::uuid)
           AND GREATEST(source_requirement_id, target_requirement_id) = GREATEST($1::uuid, $2::uuid)
           AND id <> $3",
    )
    .bind(mapping.source_requirement_id.as_uuid())
    .bind(mapping.target_requirement_id.as_uuid())
    .bind(mapping.id.as_uuid())
    .execute(&mut *conn)
    .await?;

    sqlx::query(
        "INSERT INTO requirement_mappings (id, source_requirement_id, target_requirement_id,
            mapping_type, semantic_similarity, confidence, domain_match, rationale, created_by,
            validation_status, validated_by, validated_at, created_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
         ON CONFLICT (id) DO UPDATE SET
            mapping_type = EXCLUDED.mapping_type,
            semantic_similarity = EXCLUDED.semantic_similarity,
            confidence = EXCLUDED.confidence,
            domain_match = EXCLUDED.domain_match,
            rationale = EXCLUDED.rationale,
            validation_status = EXCLUDED.validation_status,
            validated_by = EXCLUDED.validated_by,
            validated_at = EXCLUDED.validated_at",
    )
    .bind(mapping.id.as_uuid())
    .bind(mapping.source_requirement_id.as_uuid())
    .bind(mapping.target_requirement_id.as_uuid())
    .bind(mapping.mapping_type.as_str())
    .bind(mapping.semantic_similarity)
    .bind(mapping.confidence)
    .bind(mapping.domain_match)
    .bind(&mapping.rationale)
    .bind(mapping.created_by.as_str())
    .bind(mapping.validation_status.as_str())
    .bind(mapping.validated_by.map(|v| *v.as_uuid()))
    .bind(mapping.validated_at.map(Timestamp::into_datetime))
    .bind(mapping.created_at.into_datetime())
    .execute(&mut *conn)
    .await?;
    Ok(())
}

/// Delete a mapping by id. Returns whether a row existed.
pub async fn delete(conn: &mut PgConnection, id: MappingId) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM requirement_mappings WHERE id = $1")
        .bind(id.as_uuid())
        .execute(&mut *conn)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Load all mappings for hydration, oldest first. Rows with an unknown
/// type, creator or status are skipped.
pub async fn load_all(pool: &PgPool) -> Result<Vec<Mapping>, sqlx::Error> {
    let rows = sqlx::query_as::<_, MappingRow>(
        "SELECT id, source_requirement_id, target_requirement_id, mapping_type,
            semantic_similarity, confidence, domain_match, rationale, created_by,
            validation_status, validated_by, validated_at, created_at
         FROM requirement_mappings ORDER BY created_at, id",
    )
    .fetch_all(pool)
    .await?;

    let mut records = Vec::with_capacity(rows.len());
    for row in rows {
        let id = row.id;
        match row.into_record() {
            Some(record) => records.push(record),
            None => tracing::error!(mapping_id = %id, "skipping mapping row during load_all"),
        }
    }
    Ok(records)
}

#[derive(sqlx::FromRow)]
struct MappingRow {
    id: Uuid,
    source_requirement_id: Uuid,
    target_requirement_id: Uuid,
    mapping_type: String,
    semantic_similarity: f64,
    confidence: f64,
    domain_match: bool,
    rationale: Option<String>,
    created_by: String,
    validation_status: String,
    validated_by: Option<Uuid>,
    validated_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl MappingRow {
    fn into_record(self) -> Option<Mapping> {
        const TABLE: &str = "requirement_mappings";
        let mapping_type: MappingType =
            parse_column(TABLE, &self.id, "mapping_type", &self.mapping_type)?;
        let created_by: MappingCreator =
            parse_column(TABLE, &self.id, "created_by", &self.created_by)?;
        let validation_status: ValidationStatus =
            parse_column(TABLE, &self.id, "validation_status", &self.validation_status)?;
        Some(Mapping {
            id: MappingId::from_uuid(self.id),
            source_requirement_id: RequirementId::from_uuid(self.source_requirement_id),
            target_requirement_id: RequirementId::from_uuid(self.target_requirement_id),
            mapping_type,
            semantic_similarity: self.semantic_similarity,
            confidence: self.confidence,
            domain_match: self.domain_match,
            rationale: self.rationale,
            created_by,
            validation_status,
            validated_by: self.validated_by.map(ValidatorId::from_uuid),
            validated_at: self.validated_at.map(Timestamp::from_utc),
            created_at: Timestamp::from_utc(self.created_at),
        })
    }
}
