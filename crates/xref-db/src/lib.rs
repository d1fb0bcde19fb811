//! # Database Persistence Layer
//!
//! Postgres persistence for the mapping engine via SQLx.
//!
//! ## Architecture
//!
//! The database is **optional**. When `DATABASE_URL` is set, the in-memory
//! stores are hydrated from Postgres at startup and every write is carried
//! back: batch progress through [`PgCheckpoint`], validation decisions and
//! coverage snapshots through the per-table `save`/`insert` functions.
//! When absent, everything stays in memory.
//!
//! ## What is persisted
//!
//! - Frameworks and requirements (written by the import collaborator)
//! - Requirement embeddings
//! - Mappings and their validation decisions
//! - Audit answers (written by the answer collaborator, read here)
//! - Coverage snapshots

pub mod answers;
pub mod checkpoint;
pub mod embeddings;
pub mod frameworks;
pub mod hydrate;
pub mod mappings;
pub mod requirements;
pub mod snapshots;

use std::str::FromStr;

use sqlx::postgres::{PgPool, PgPoolOptions};

pub use checkpoint::PgCheckpoint;
pub use hydrate::{hydrate, HydrationReport};

/// Initialize the database connection pool and run migrations.
///
/// Returns `None` if `DATABASE_URL` is not set (in-memory-only mode).
/// Returns `Err` if the URL is set but the connection or migration fails.
pub async fn init_pool() -> Result<Option<PgPool>, sqlx::Error> {
    let url = match std::env::var("DATABASE_URL") {
        Ok(url) => url,
        Err(_) => {
            tracing::warn!("DATABASE_URL not set, running in-memory only; results will not be persisted");
            return Ok(None);
        }
    };

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .min_connections(1)
        .acquire_timeout(std::time::Duration::from_secs(5))
        .connect(&url)
        .await?;

    tracing::info!("Connected to PostgreSQL");

    sqlx::migrate!("./migrations").run(&pool).await?;
    tracing::info!("Database migrations applied");

    Ok(Some(pool))
}

/// Parse a wire-format column, logging rows that carry unknown values.
pub(crate) fn parse_column<T: FromStr>(
    table: &'static str,
    id: &uuid::Uuid,
    column: &'static str,
    raw: &str,
) -> Option<T> {
    match raw.parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(table, id = %id, column, value = raw, "unknown value in database");
            None
        }
    }
}
