//! Subcommand definitions and handlers.
//!
//! Every handler returns a JSON value that `main` prints to stdout. Batch
//! jobs (indexing, detection, pruning) run on a blocking thread; with a
//! database they checkpoint through [`PgCheckpoint`]. Single-record writes
//! (validation decisions, manual mappings, answers, coverage snapshots)
//! are carried to Postgres right after the in-memory store accepts them.
//! `summary` and `compare` compute fresh coverage, so they record snapshot
//! batches too.
//! In fixture mode the whole state is written back after any mutating
//! command.

use anyhow::{Context, Result};
use clap::{Subcommand, ValueEnum};
use serde_json::{json, Value};
use tokio::runtime::Handle;
use xref_core::{AnswerFact, AuditId, MappingId, MappingType, RequirementId, ValidatorId};
use xref_coverage::AnswerSource;
use xref_db::PgCheckpoint;
use xref_engine::{Checkpoint, DetectOptions, NoCheckpoint, RequirementCatalog};

use crate::app::App;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List frameworks with their requirement counts.
    Frameworks,

    /// Embed every requirement of a framework.
    Index {
        /// Framework code or id.
        framework: String,
        /// Re-embed requirements that already have a vector.
        #[arg(long)]
        force: bool,
    },

    /// Detect cross-framework mappings for a framework.
    Detect {
        /// Framework code or id.
        framework: String,
        /// Drop the framework's prior mappings and re-embed first.
        #[arg(long)]
        force_regenerate: bool,
    },

    /// List mappings awaiting review, highest similarity first.
    Pending {
        /// Only mappings touching this framework (code or id).
        #[arg(long)]
        framework: Option<String>,
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Approve or reject a mapping.
    Validate {
        mapping: MappingId,
        decision: Decision,
        #[arg(long)]
        validator: ValidatorId,
        #[arg(long)]
        rationale: Option<String>,
    },

    /// Record a reviewer-curated mapping between two requirements.
    Link {
        source: RequirementId,
        target: RequirementId,
        #[arg(long = "type", default_value = "related")]
        mapping_type: MappingType,
        #[arg(long)]
        validator: ValidatorId,
        #[arg(long)]
        rationale: Option<String>,
    },

    /// Record an audit answer for a requirement.
    Answer {
        audit: AuditId,
        requirement: RequirementId,
        #[arg(long)]
        non_compliant: bool,
    },

    /// Compute and store coverage for an audit.
    Coverage {
        audit: AuditId,
        /// Only this framework (code or id), even if inactive.
        #[arg(long)]
        framework: Option<String>,
    },

    /// Stored coverage snapshots of an audit, newest first.
    History { audit: AuditId },

    /// Headline coverage figures of an audit.
    Summary { audit: AuditId },

    /// Compare coverage across audits.
    Compare {
        #[arg(required = true)]
        audits: Vec<AuditId>,
    },

    /// Mapping counts, similarity and approval rate.
    Stats {
        /// Restrict to mappings touching this framework (code or id).
        #[arg(long)]
        framework: Option<String>,
    },

    /// Non-rejected mappings of a requirement.
    Equivalences { requirement: RequirementId },

    /// Delete embeddings whose requirement is gone.
    PruneEmbeddings,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Decision {
    Approve,
    Reject,
}

impl Command {
    fn mutates(&self) -> bool {
        !matches!(
            self,
            Command::Frameworks
                | Command::Pending { .. }
                | Command::History { .. }
                | Command::Stats { .. }
                | Command::Equivalences { .. }
        )
    }
}

/// Execute `command` against `app`.
pub async fn run(app: &App, command: Command) -> Result<Value> {
    let mutates = command.mutates();
    let value = dispatch(app, command).await?;
    if mutates {
        app.persist_fixture()?;
    }
    Ok(value)
}

async fn dispatch(app: &App, command: Command) -> Result<Value> {
    match command {
        Command::Frameworks => {
            let catalog = &app.stores.catalog;
            let rows: Vec<Value> = catalog
                .frameworks()
                .into_iter()
                .map(|fw| {
                    let requirements = catalog.requirements_of(fw.id).len();
                    json!({
                        "id": fw.id,
                        "code": fw.code,
                        "name": fw.name,
                        "version": fw.version,
                        "is_active": fw.is_active,
                        "requirements": requirements,
                    })
                })
                .collect();
            Ok(Value::Array(rows))
        }

        Command::Index { framework, force } => {
            let fw = app.resolve_framework(&framework)?;
            let summary = run_batch(app, move |app, checkpoint| {
                let indexer = app.indexer()?;
                Ok(indexer.index_framework(fw.id, force, checkpoint)?)
            })
            .await?;
            Ok(serde_json::to_value(summary)?)
        }

        Command::Detect {
            framework,
            force_regenerate,
        } => {
            let fw = app.resolve_framework(&framework)?;
            let summary = run_batch(app, move |app, checkpoint| {
                let detector = app.detector()?;
                Ok(detector.detect(fw.id, DetectOptions { force_regenerate }, checkpoint)?)
            })
            .await?;
            Ok(serde_json::to_value(summary)?)
        }

        Command::Pending { framework, limit } => {
            let framework = framework
                .map(|f| app.resolve_framework(&f))
                .transpose()?
                .map(|fw| fw.id);
            let pending = app.workflow().pending_mappings(framework, limit);
            Ok(serde_json::to_value(pending)?)
        }

        Command::Validate {
            mapping,
            decision,
            validator,
            rationale,
        } => {
            let updated = app.workflow().validate(
                mapping,
                validator,
                decision == Decision::Approve,
                rationale,
            )?;
            if let Some(pool) = app.pool() {
                xref_db::mappings::save(pool, &updated)
                    .await
                    .context("failed to persist validation decision")?;
            }
            Ok(serde_json::to_value(updated)?)
        }

        Command::Link {
            source,
            target,
            mapping_type,
            validator,
            rationale,
        } => {
            let mapping = app.workflow().record_manual_mapping(
                source,
                target,
                mapping_type,
                validator,
                rationale,
            )?;
            if let Some(pool) = app.pool() {
                xref_db::mappings::save(pool, &mapping)
                    .await
                    .context("failed to persist manual mapping")?;
            }
            Ok(serde_json::to_value(mapping)?)
        }

        Command::Answer {
            audit,
            requirement,
            non_compliant,
        } => {
            if app.stores.catalog.requirement(requirement).is_none() {
                anyhow::bail!("unknown requirement {requirement}");
            }
            let fact = AnswerFact {
                requirement_id: requirement,
                compliant: !non_compliant,
            };
            app.stores.answers.record(audit, fact);
            if let Some(pool) = app.pool() {
                xref_db::answers::insert(pool, audit, fact)
                    .await
                    .context("failed to persist answer")?;
            }
            let compliant = app.stores.answers.compliant_requirements(audit).len();
            Ok(json!({ "audit_id": audit, "recorded": fact, "compliant_requirements": compliant }))
        }

        Command::Coverage { audit, framework } => {
            let framework = framework
                .map(|f| app.resolve_framework(&f))
                .transpose()?
                .map(|fw| fw.id);
            let recorded_before = app.stores.snapshots.batches().len();
            let results = app.coverage_service().coverage(audit, framework)?;
            persist_new_snapshots(app, recorded_before).await?;
            Ok(json!({ "audit_id": audit, "frameworks": results }))
        }

        Command::History { audit } => {
            let history = app.coverage_service().coverage_history(audit);
            Ok(json!({ "audit_id": audit, "history": history }))
        }

        Command::Summary { audit } => {
            let recorded_before = app.stores.snapshots.batches().len();
            let summary = app.coverage_service().coverage_summary(audit)?;
            persist_new_snapshots(app, recorded_before).await?;
            Ok(serde_json::to_value(summary)?)
        }

        Command::Compare { audits } => {
            let recorded_before = app.stores.snapshots.batches().len();
            let comparison = app.coverage_service().compare_audits(&audits)?;
            persist_new_snapshots(app, recorded_before).await?;
            Ok(serde_json::to_value(comparison)?)
        }

        Command::Stats { framework } => {
            let framework = framework
                .map(|f| app.resolve_framework(&f))
                .transpose()?
                .map(|fw| fw.id);
            Ok(serde_json::to_value(app.workflow().mapping_statistics(framework))?)
        }

        Command::Equivalences { requirement } => {
            let equivalences = app.workflow().equivalences(requirement)?;
            Ok(json!({ "requirement_id": requirement, "equivalences": equivalences }))
        }

        Command::PruneEmbeddings => {
            let removed = run_batch(app, |app, checkpoint| {
                Ok(app.indexer()?.prune_orphans(checkpoint)?)
            })
            .await?;
            Ok(json!({ "removed": removed }))
        }
    }
}

/// Write snapshot batches recorded since `recorded_before` to Postgres.
async fn persist_new_snapshots(app: &App, recorded_before: usize) -> Result<()> {
    let Some(pool) = app.pool() else {
        return Ok(());
    };
    for batch in app.stores.snapshots.batches().iter().skip(recorded_before) {
        xref_db::snapshots::insert_batch(pool, batch)
            .await
            .context("failed to persist coverage snapshots")?;
    }
    Ok(())
}

/// Run a synchronous batch job on the blocking pool with the checkpoint
/// matching the app's persistence.
async fn run_batch<T, F>(app: &App, job: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce(&App, &mut dyn Checkpoint) -> Result<T> + Send + 'static,
{
    let app = app.clone();
    tokio::task::spawn_blocking(move || {
        let mut checkpoint: Box<dyn Checkpoint> = match app.pool() {
            Some(pool) => Box::new(PgCheckpoint::new(pool.clone(), Handle::current())),
            None => Box::new(NoCheckpoint),
        };
        job(&app, checkpoint.as_mut())
    })
    .await
    .context("batch job panicked")?
}
