//! Framework persistence operations.

use sqlx::PgPool;
use uuid::Uuid;
use xref_core::{Framework, FrameworkId};

/// Insert or update a framework.
pub async fn upsert(pool: &PgPool, framework: &Framework) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO frameworks (id, code, name, version, is_active)
         VALUES ($1, $2, $3, $4, $5)
         ON CONFLICT (id) DO UPDATE SET
            code = EXCLUDED.code,
            name = EXCLUDED.name,
            version = EXCLUDED.version,
            is_active = EXCLUDED.is_active",
    )
    .bind(framework.id.as_uuid())
    .bind(&framework.code)
    .bind(&framework.name)
    .bind(&framework.version)
    .bind(framework.is_active)
    .execute(pool)
    .await?;
    Ok(())
}

/// Load all frameworks for hydration.
pub async fn load_all(pool: &PgPool) -> Result<Vec<Framework>, sqlx::Error> {
    let rows = sqlx::query_as::<_, FrameworkRow>(
        "SELECT id, code, name, version, is_active FROM frameworks ORDER BY code",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(FrameworkRow::into_record).collect())
}

#[derive(sqlx::FromRow)]
struct FrameworkRow {
    id: Uuid,
    code: String,
    name: String,
    version: Option<String>,
    is_active: bool,
}

impl FrameworkRow {
    fn into_record(self) -> Framework {
        Framework {
            id: FrameworkId::from_uuid(self.id),
            code: self.code,
            name: self.name,
            version: self.version,
            is_active: self.is_active,
        }
    }
}
