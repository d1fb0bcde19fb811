//! Coverage snapshot persistence operations.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;
use xref_core::{AuditId, CoverageMethod, CoverageSnapshot, FrameworkId, SnapshotId, Timestamp};

use crate::parse_column;

/// Append the snapshots of one computation atomically.
pub async fn insert_batch(pool: &PgPool, snapshots: &[CoverageSnapshot]) -> Result<(), sqlx::Error> {
    if snapshots.is_empty() {
        return Ok(());
    }
    let batch_id = Uuid::new_v4();
    let mut tx = pool.begin().await?;
    for s in snapshots {
        sqlx::query(
            "INSERT INTO coverage_snapshots (id, batch_id, audit_id, framework_id, covered, total,
                percentage, method, calculated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(s.id.as_uuid())
        .bind(batch_id)
        .bind(s.audit_id.as_uuid())
        .bind(s.framework_id.as_uuid())
        .bind(i32::try_from(s.covered).unwrap_or(i32::MAX))
        .bind(i32::try_from(s.total).unwrap_or(i32::MAX))
        .bind(s.percentage)
        .bind(s.method.as_str())
        .bind(s.calculated_at.into_datetime())
        .execute(&mut *tx)
        .await?;
    }
    tx.commit().await
}

/// Load every snapshot in insertion order, grouped into computations.
pub async fn load_all(pool: &PgPool) -> Result<Vec<Vec<CoverageSnapshot>>, sqlx::Error> {
    let rows = sqlx::query_as::<_, SnapshotRow>(
        "SELECT id, batch_id, audit_id, framework_id, covered, total, percentage, method,
            calculated_at
         FROM coverage_snapshots ORDER BY row_no",
    )
    .fetch_all(pool)
    .await?;

    let mut batches: Vec<(Uuid, Vec<CoverageSnapshot>)> = Vec::new();
    for row in rows {
        let batch_id = row.batch_id;
        let Some(snapshot) = row.into_record() else {
            continue;
        };
        match batches.last_mut() {
            Some((id, group)) if *id == batch_id => group.push(snapshot),
            _ => batches.push((batch_id, vec![snapshot])),
        }
    }
    Ok(batches.into_iter().map(|(_, group)| group).collect())
}

#[derive(sqlx::FromRow)]
struct SnapshotRow {
    id: Uuid,
    batch_id: Uuid,
    audit_id: Uuid,
    framework_id: Uuid,
    covered: i32,
    total: i32,
    percentage: f64,
    method: String,
    calculated_at: DateTime<Utc>,
}

impl SnapshotRow {
    fn into_record(self) -> Option<CoverageSnapshot> {
        let method: CoverageMethod =
            parse_column("coverage_snapshots", &self.id, "method", &self.method)?;
        Some(CoverageSnapshot {
            id: SnapshotId::from_uuid(self.id),
            audit_id: AuditId::from_uuid(self.audit_id),
            framework_id: FrameworkId::from_uuid(self.framework_id),
            covered: u32::try_from(self.covered).unwrap_or(0),
            total: u32::try_from(self.total).unwrap_or(0),
            percentage: self.percentage,
            method,
            calculated_at: Timestamp::from_utc(self.calculated_at),
        })
    }
}
