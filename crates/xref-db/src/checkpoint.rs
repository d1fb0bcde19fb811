//! Batch checkpoints written to Postgres.

use sqlx::PgPool;
use tokio::runtime::Handle;
use xref_engine::{Changeset, Checkpoint, CheckpointError};

use crate::{embeddings, mappings};

/// Writes each checkpointed [`Changeset`] in a single transaction.
///
/// Batch jobs are synchronous, so `commit` blocks on `handle`. It must be
/// used from a blocking thread (`tokio::task::spawn_blocking`), never from
/// inside an async task.
pub struct PgCheckpoint {
    pool: PgPool,
    handle: Handle,
}

impl PgCheckpoint {
    pub fn new(pool: PgPool, handle: Handle) -> Self {
        Self { pool, handle }
    }

    async fn write(&self, changes: &Changeset) -> Result<(), sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        for id in &changes.removed_mappings {
            mappings::delete(&mut tx, *id).await?;
        }
        for id in &changes.removed_embeddings {
            embeddings::delete(&mut *tx, *id).await?;
        }
        for record in &changes.embeddings {
            embeddings::upsert(&mut *tx, record).await?;
        }
        for mapping in &changes.mappings {
            mappings::upsert(&mut tx, mapping).await?;
        }
        tx.commit().await
    }
}

impl Checkpoint for PgCheckpoint {
    fn commit(&mut self, changes: &Changeset) -> Result<(), CheckpointError> {
        self.handle.block_on(self.write(changes)).map_err(|e| {
            tracing::error!(error = %e, writes = changes.len(), "checkpoint transaction failed");
            CheckpointError {
                reason: e.to_string(),
            }
        })?;
        tracing::debug!(writes = changes.len(), "checkpoint committed");
        Ok(())
    }
}
