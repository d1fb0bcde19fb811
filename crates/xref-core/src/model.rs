//! # Records
//!
//! Framework, requirement, mapping and coverage snapshot records. These are
//! plain data: the stage crates own the behaviour that creates and mutates
//! them, and `xref-db` owns their relational form.

use serde::{Deserialize, Serialize};

use crate::identity::{AuditId, FrameworkId, MappingId, RequirementId, SnapshotId, ValidatorId};
use crate::taxonomy::{
    ComplianceObligation, CoverageMethod, MappingCreator, MappingType, RiskLevel,
    ValidationStatus,
};
use crate::temporal::Timestamp;

/// A named compliance standard (e.g. ISO 27001, EBIOS RM).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Framework {
    pub id: FrameworkId,
    /// Short code, e.g. `ISO27001`.
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

impl Framework {
    /// An active framework with a fresh identifier.
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: FrameworkId::new(),
            code: code.into(),
            name: name.into(),
            version: None,
            is_active: true,
        }
    }
}

/// One clause or control statement within a framework.
///
/// Immutable once imported, except for domain placement which the import
/// process may correct.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Requirement {
    pub id: RequirementId,
    pub framework_id: FrameworkId,
    /// Official clause code, e.g. `A.5.1`.
    pub official_code: String,
    pub title: String,
    #[serde(default)]
    pub body: String,
    /// Resolved hierarchical domain path, e.g. `Organisation > Policies`.
    #[serde(default)]
    pub domain_path: Option<String>,
    /// Chapter label, used when no domain path resolves.
    #[serde(default)]
    pub chapter: Option<String>,
    #[serde(default)]
    pub domain_label: Option<String>,
    #[serde(default)]
    pub subdomain_label: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub risk_level: Option<RiskLevel>,
    #[serde(default)]
    pub obligation: Option<ComplianceObligation>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    /// Position in import order within the catalog.
    #[serde(default)]
    pub sequence: u64,
}

impl Requirement {
    /// An active requirement with only the mandatory fields set.
    pub fn new(
        framework_id: FrameworkId,
        official_code: impl Into<String>,
        title: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            id: RequirementId::new(),
            framework_id,
            official_code: official_code.into(),
            title: title.into(),
            body: body.into(),
            domain_path: None,
            chapter: None,
            domain_label: None,
            subdomain_label: None,
            tags: Vec::new(),
            risk_level: None,
            obligation: None,
            is_active: true,
            sequence: 0,
        }
    }

    /// Set the domain label.
    pub fn with_domain(mut self, label: impl Into<String>) -> Self {
        self.domain_label = Some(label.into());
        self
    }

    /// Set the tags.
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// The label used for domain-match comparison: the domain label, else
    /// the domain path, else the chapter. Trimmed; blank values are skipped.
    pub fn resolved_domain_label(&self) -> Option<&str> {
        [&self.domain_label, &self.domain_path, &self.chapter]
            .into_iter()
            .filter_map(|v| v.as_deref())
            .map(str::trim)
            .find(|s| !s.is_empty())
    }
}

/// A single audit answer fact, as supplied by the answer subsystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerFact {
    pub requirement_id: RequirementId,
    pub compliant: bool,
}

/// A semantic relationship between requirements of two frameworks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mapping {
    pub id: MappingId,
    pub source_requirement_id: RequirementId,
    pub target_requirement_id: RequirementId,
    pub mapping_type: MappingType,
    /// `1 - L2 distance` between the unit embeddings, in `[0, 1]`.
    pub semantic_similarity: f64,
    pub confidence: f64,
    pub domain_match: bool,
    #[serde(default)]
    pub rationale: Option<String>,
    pub created_by: MappingCreator,
    pub validation_status: ValidationStatus,
    #[serde(default)]
    pub validated_by: Option<ValidatorId>,
    #[serde(default)]
    pub validated_at: Option<Timestamp>,
    pub created_at: Timestamp,
}

impl Mapping {
    /// Whether `id` is either endpoint of this mapping.
    pub fn touches(&self, id: RequirementId) -> bool {
        self.source_requirement_id == id || self.target_requirement_id == id
    }

    /// The endpoint opposite `id`, if `id` is an endpoint.
    pub fn counterpart(&self, id: RequirementId) -> Option<RequirementId> {
        if self.source_requirement_id == id {
            Some(self.target_requirement_id)
        } else if self.target_requirement_id == id {
            Some(self.source_requirement_id)
        } else {
            None
        }
    }
}

/// One computed coverage figure for an (audit, framework) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverageSnapshot {
    pub id: SnapshotId,
    pub audit_id: AuditId,
    pub framework_id: FrameworkId,
    pub covered: u32,
    pub total: u32,
    /// Percentage in `[0, 100]`, two decimals.
    pub percentage: f64,
    pub method: CoverageMethod,
    pub calculated_at: Timestamp,
}

fn default_true() -> bool {
    true
}
