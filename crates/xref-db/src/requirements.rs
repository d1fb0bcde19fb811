//! Requirement persistence operations.
//!
//! Requirements are owned by the import collaborator; the engine only
//! reads them, so `upsert` exists for imports and fixtures.

use sqlx::PgPool;
use uuid::Uuid;
use xref_core::{
    ComplianceObligation, FrameworkId, Requirement, RequirementId, RiskLevel,
};

use crate::parse_column;

/// Insert or update a requirement.
pub async fn upsert(pool: &PgPool, requirement: &Requirement) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO requirements (id, framework_id, official_code, title, body, domain_path,
            chapter, domain_label, subdomain_label, tags, risk_level, obligation, is_active, sequence)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
         ON CONFLICT (id) DO UPDATE SET
            official_code = EXCLUDED.official_code,
            title = EXCLUDED.title,
            body = EXCLUDED.body,
            domain_path = EXCLUDED.domain_path,
            chapter = EXCLUDED.chapter,
            domain_label = EXCLUDED.domain_label,
            subdomain_label = EXCLUDED.subdomain_label,
            tags = EXCLUDED.tags,
            risk_level = EXCLUDED.risk_level,
            obligation = EXCLUDED.obligation,
            is_active = EXCLUDED.is_active",
    )
    .bind(requirement.id.as_uuid())
    .bind(requirement.framework_id.as_uuid())
    .bind(&requirement.official_code)
    .bind(&requirement.title)
    .bind(&requirement.body)
    .bind(&requirement.domain_path)
    .bind(&requirement.chapter)
    .bind(&requirement.domain_label)
    .bind(&requirement.subdomain_label)
    .bind(&requirement.tags)
    .bind(requirement.risk_level.map(|r| r.as_str()))
    .bind(requirement.obligation.map(|o| o.as_str()))
    .bind(requirement.is_active)
    .bind(i64::try_from(requirement.sequence).unwrap_or(i64::MAX))
    .execute(pool)
    .await?;
    Ok(())
}

/// Load all requirements in import order.
pub async fn load_all(pool: &PgPool) -> Result<Vec<Requirement>, sqlx::Error> {
    let rows = sqlx::query_as::<_, RequirementRow>(
        "SELECT id, framework_id, official_code, title, body, domain_path, chapter,
            domain_label, subdomain_label, tags, risk_level, obligation, is_active, sequence
         FROM requirements ORDER BY sequence",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(RequirementRow::into_record).collect())
}

#[derive(sqlx::FromRow)]
struct RequirementRow {
    id: Uuid,
    framework_id: Uuid,
    official_code: String,
    title: String,
    body: String,
    domain_path: Option<String>,
    chapter: Option<String>,
    domain_label: Option<String>,
    subdomain_label: Option<String>,
    tags: Vec<String>,
    risk_level: Option<String>,
    obligation: Option<String>,
    is_active: bool,
    sequence: i64,
}

impl RequirementRow {
    fn into_record(self) -> Requirement {
        // An unknown label is dropped rather than failing the whole load.
        let risk_level = self
            .risk_level
            .as_deref()
            .and_then(|raw| parse_column::<RiskLevel>("requirements", &self.id, "risk_level", raw));
        let obligation = self.obligation.as_deref().and_then(|raw| {
            parse_column::<ComplianceObligation>("requirements", &self.id, "obligation", raw)
        });
        Requirement {
            id: RequirementId::from_uuid(self.id),
            framework_id: FrameworkId::from_uuid(self.framework_id),
            official_code: self.official_code,
            title: self.title,
            body: self.body,
            domain_path: self.domain_path,
            chapter: self.chapter,
            domain_label: self.domain_label,
            subdomain_label: self.subdomain_label,
            tags: self.tags,
            risk_level,
            obligation,
            is_active: self.is_active,
            sequence: u64::try_from(self.sequence).unwrap_or(0),
        }
    }
}
