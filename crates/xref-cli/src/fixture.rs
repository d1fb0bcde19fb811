//! JSON fixture files: the whole engine state in one document, for
//! offline use without Postgres.
//!
//! ```json
//! {
//!   "frameworks": [{ "id": "…", "code": "ISO27001", "name": "ISO/IEC 27001", "is_active": true }],
//!   "requirements": [{ "id": "…", "framework_id": "…", "official_code": "A.5.1", "title": "…" }],
//!   "answers": [{ "audit_id": "…", "requirement_id": "…", "compliant": true }]
//! }
//! ```
//!
//! Every section is optional. Embeddings, mappings and snapshots are
//! written back after each command.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use xref_core::{AnswerFact, AuditId, CoverageSnapshot, Framework, Mapping, Requirement, RequirementId};
use xref_coverage::{AnswerSource, SnapshotStore};
use xref_engine::{MappingRepository, RequirementCatalog};
use xref_vector::{EmbeddingRecord, VectorStore};

use crate::app::Stores;

/// One answer row of a fixture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditAnswer {
    pub audit_id: AuditId,
    pub requirement_id: RequirementId,
    pub compliant: bool,
}

/// Serialized engine state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Fixture {
    pub frameworks: Vec<Framework>,
    pub requirements: Vec<Requirement>,
    pub embeddings: Vec<EmbeddingRecord>,
    pub mappings: Vec<Mapping>,
    pub answers: Vec<AuditAnswer>,
    /// Coverage computations, oldest first.
    pub snapshots: Vec<Vec<CoverageSnapshot>>,
}

impl Fixture {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read fixture {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse fixture {}", path.display()))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize fixture")?;
        std::fs::write(path, json)
            .with_context(|| format!("failed to write fixture {}", path.display()))
    }

    /// Load this fixture into empty stores.
    pub fn apply(self, stores: &Stores) -> Result<()> {
        for fw in self.frameworks {
            stores.catalog.insert_framework(fw);
        }
        for r in self.requirements {
            stores.catalog.insert_requirement(r);
        }
        for e in self.embeddings {
            let id = e.requirement_id;
            stores
                .vectors
                .upsert(e)
                .with_context(|| format!("fixture embedding for requirement {id}"))?;
        }
        for m in self.mappings {
            let id = m.id;
            stores
                .mappings
                .insert(m)
                .with_context(|| format!("fixture mapping {id}"))?;
        }
        for a in self.answers {
            stores.answers.record(
                a.audit_id,
                AnswerFact {
                    requirement_id: a.requirement_id,
                    compliant: a.compliant,
                },
            );
        }
        for batch in self.snapshots {
            stores.snapshots.record(&batch)?;
        }
        Ok(())
    }

    /// Snapshot the current contents of `stores`.
    pub fn capture(stores: &Stores) -> Self {
        let frameworks = stores.catalog.frameworks();
        let requirements = frameworks
            .iter()
            .flat_map(|fw| stores.catalog.requirements_of(fw.id))
            .collect();
        let answers = stores
            .answers
            .audits()
            .into_iter()
            .flat_map(|audit| {
                stores
                    .answers
                    .answers(audit)
                    .into_iter()
                    .map(move |fact| AuditAnswer {
                        audit_id: audit,
                        requirement_id: fact.requirement_id,
                        compliant: fact.compliant,
                    })
            })
            .collect();
        Self {
            frameworks,
            requirements,
            embeddings: stores.vectors.records(),
            mappings: stores.mappings.list(),
            answers,
            snapshots: stores.snapshots.batches(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_is_empty_fixture() {
        let fixture: Fixture = serde_json::from_str("{}").unwrap();
        assert_eq!(fixture, Fixture::default());
    }

    #[test]
    fn capture_after_apply_preserves_content() {
        let fw = Framework::new("ISO27001", "ISO/IEC 27001");
        let r = Requirement::new(fw.id, "A.5.1", "Policies", "Define an ISMS policy.");
        let audit = AuditId::new();
        let fixture = Fixture {
            frameworks: vec![fw.clone()],
            requirements: vec![r.clone()],
            answers: vec![AuditAnswer {
                audit_id: audit,
                requirement_id: r.id,
                compliant: true,
            }],
            ..Fixture::default()
        };

        let stores = Stores::new();
        fixture.apply(&stores).unwrap();
        let captured = Fixture::capture(&stores);
        assert_eq!(captured.frameworks, vec![fw]);
        assert_eq!(captured.requirements.len(), 1);
        assert_eq!(captured.requirements[0].id, r.id);
        assert_eq!(captured.answers.len(), 1);
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        let fixture = Fixture {
            frameworks: vec![Framework::new("EBIOS", "EBIOS RM")],
            ..Fixture::default()
        };
        fixture.save(&path).unwrap();
        assert_eq!(Fixture::load(&path).unwrap(), fixture);
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Fixture::load(&dir.path().join("absent.json")).is_err());
    }
}
