//! Store wiring for a CLI invocation.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use sqlx::PgPool;
use xref_core::{Framework, FrameworkId};
use xref_coverage::{CoverageService, MemoryAnswerSource, MemorySnapshotStore};
use xref_embed::{ConfigError, EmbeddingGenerator, EncoderConfig, HashingEncoder, HttpEncoder};
use xref_engine::{
    EmbeddingIndexer, EngineConfig, MappingDetector, MemoryCatalog, MemoryMappingRepository,
    RequirementCatalog, ValidationWorkflow,
};
use xref_vector::MemoryVectorStore;

use crate::fixture::Fixture;

/// The in-memory stores every command operates on. Clones share data.
#[derive(Debug, Clone, Default)]
pub struct Stores {
    pub catalog: MemoryCatalog,
    pub vectors: MemoryVectorStore,
    pub mappings: MemoryMappingRepository,
    pub answers: MemoryAnswerSource,
    pub snapshots: MemorySnapshotStore,
}

impl Stores {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Where state comes from and where writes go.
#[derive(Debug, Clone)]
pub enum Persistence {
    /// Nothing survives the process.
    Memory,
    /// State is read from and written back to a JSON file.
    Fixture(PathBuf),
    /// Hydrated from Postgres; writes are carried back.
    Postgres(PgPool),
}

#[derive(Debug, Clone)]
pub struct App {
    pub stores: Stores,
    pub config: EngineConfig,
    pub persistence: Persistence,
}

impl App {
    /// Open the state for this invocation. A fixture file wins over
    /// `DATABASE_URL`; with neither, the stores start empty.
    pub async fn open(fixture: Option<PathBuf>, config: EngineConfig) -> Result<Self> {
        let stores = Stores::new();

        if let Some(path) = fixture {
            if path.exists() {
                Fixture::load(&path)?.apply(&stores)?;
            } else {
                tracing::info!(path = %path.display(), "fixture does not exist yet; starting empty");
            }
            return Ok(Self {
                stores,
                config,
                persistence: Persistence::Fixture(path),
            });
        }

        let persistence = match xref_db::init_pool()
            .await
            .context("failed to initialize database")?
        {
            Some(pool) => {
                xref_db::hydrate(
                    &pool,
                    &stores.catalog,
                    &stores.vectors,
                    &stores.mappings,
                    &stores.answers,
                    &stores.snapshots,
                )
                .await
                .context("failed to load state from database")?;
                Persistence::Postgres(pool)
            }
            None => Persistence::Memory,
        };
        Ok(Self {
            stores,
            config,
            persistence,
        })
    }

    /// An app over the given stores, without persistence.
    pub fn in_memory(stores: Stores, config: EngineConfig) -> Self {
        Self {
            stores,
            config,
            persistence: Persistence::Memory,
        }
    }

    pub fn catalog(&self) -> Arc<dyn RequirementCatalog> {
        Arc::new(self.stores.catalog.clone())
    }

    pub fn workflow(&self) -> ValidationWorkflow {
        ValidationWorkflow::new(
            self.catalog(),
            Arc::new(self.stores.mappings.clone()),
            self.config.clone(),
        )
    }

    pub fn coverage_service(&self) -> CoverageService {
        CoverageService::new(
            self.catalog(),
            Arc::new(self.stores.mappings.clone()),
            Arc::new(self.stores.answers.clone()),
            Arc::new(self.stores.snapshots.clone()),
            &self.config,
        )
    }

    /// Indexer over these stores. Encoding blocks, so build and use it on
    /// a blocking thread.
    pub fn indexer(&self) -> Result<EmbeddingIndexer> {
        Ok(EmbeddingIndexer::new(
            self.catalog(),
            Arc::new(self.stores.vectors.clone()),
            build_generator()?,
            self.config.clone(),
        ))
    }

    pub fn detector(&self) -> Result<MappingDetector> {
        Ok(MappingDetector::new(
            self.catalog(),
            Arc::new(self.stores.vectors.clone()),
            Arc::new(self.stores.mappings.clone()),
            self.indexer()?,
            self.config.clone(),
        ))
    }

    /// Find a framework by code (case-insensitive) or by id.
    pub fn resolve_framework(&self, code_or_id: &str) -> Result<Framework> {
        let catalog = &self.stores.catalog;
        if let Ok(id) = code_or_id.parse::<FrameworkId>() {
            if let Some(fw) = catalog.framework(id) {
                return Ok(fw);
            }
        }
        match catalog
            .frameworks()
            .into_iter()
            .find(|fw| fw.code.eq_ignore_ascii_case(code_or_id))
        {
            Some(fw) => Ok(fw),
            None => bail!("unknown framework {code_or_id:?}"),
        }
    }

    /// Write the stores back to the fixture file, if there is one.
    pub fn persist_fixture(&self) -> Result<()> {
        if let Persistence::Fixture(path) = &self.persistence {
            Fixture::capture(&self.stores).save(path)?;
            tracing::debug!(path = %path.display(), "fixture saved");
        }
        Ok(())
    }

    pub fn pool(&self) -> Option<&PgPool> {
        match &self.persistence {
            Persistence::Postgres(pool) => Some(pool),
            _ => None,
        }
    }
}

/// The remote encoder when `XREF_ENCODER_URL` is set, otherwise the
/// offline hashing encoder.
pub fn build_generator() -> Result<EmbeddingGenerator> {
    match EncoderConfig::from_env() {
        Ok(config) => {
            let encoder = HttpEncoder::new(config).context("failed to build encoder client")?;
            Ok(EmbeddingGenerator::new(Arc::new(encoder)))
        }
        Err(ConfigError::MissingUrl) => {
            tracing::info!("XREF_ENCODER_URL not set; using the offline hashing encoder");
            Ok(EmbeddingGenerator::new(Arc::new(HashingEncoder::default())))
        }
        Err(e) => Err(e).context("invalid encoder configuration"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_by_code_and_id() {
        let app = App::in_memory(Stores::new(), EngineConfig::default());
        let fw = Framework::new("ISO27001", "ISO/IEC 27001");
        app.stores.catalog.insert_framework(fw.clone());

        assert_eq!(app.resolve_framework("iso27001").unwrap().id, fw.id);
        assert_eq!(app.resolve_framework(&fw.id.to_string()).unwrap().id, fw.id);
        assert!(app.resolve_framework("NIS2").is_err());
    }
}
