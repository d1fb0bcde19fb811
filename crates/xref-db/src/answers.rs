//! Audit answer reads. Answers are written by the audit collaborator.

use sqlx::PgPool;
use uuid::Uuid;
use xref_core::{AnswerFact, AuditId, RequirementId};

/// Record one answer fact.
pub async fn insert(pool: &PgPool, audit: AuditId, fact: AnswerFact) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT INTO audit_answers (audit_id, requirement_id, compliant) VALUES ($1, $2, $3)")
        .bind(audit.as_uuid())
        .bind(fact.requirement_id.as_uuid())
        .bind(fact.compliant)
        .execute(pool)
        .await?;
    Ok(())
}

/// Load every answer fact in recording order.
pub async fn load_all(pool: &PgPool) -> Result<Vec<(AuditId, AnswerFact)>, sqlx::Error> {
    let rows = sqlx::query_as::<_, AnswerRow>(
        "SELECT audit_id, requirement_id, compliant FROM audit_answers ORDER BY recorded_at",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows
        .into_iter()
        .map(|r| {
            (
                AuditId::from_uuid(r.audit_id),
                AnswerFact {
                    requirement_id: RequirementId::from_uuid(r.requirement_id),
                    compliant: r.compliant,
                },
            )
        })
        .collect())
}

#[derive(sqlx::FromRow)]
struct AnswerRow {
    audit_id: Uuid,
    requirement_id: Uuid,
    compliant: bool,
}
