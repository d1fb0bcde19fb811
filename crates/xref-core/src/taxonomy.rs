//! # Classification Taxonomies
//!
//! Closed vocabularies used across the mapping engine. Each enum has one
//! snake_case wire form shared by serde, `Display`, `FromStr` and the SQL
//! text columns, so a value round-trips identically through JSON fixtures,
//! the database and log output.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::XrefError;

macro_rules! wire_format {
    ($ty:ident, $kind:literal, { $($variant:ident => $wire:literal),+ $(,)? }) => {
        impl $ty {
            /// Returns the snake_case wire identifier.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $wire,)+
                }
            }
        }

        impl std::fmt::Display for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = XrefError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($wire => Ok(Self::$variant),)+
                    other => Err(XrefError::UnknownVariant {
                        kind: $kind,
                        value: other.to_string(),
                    }),
                }
            }
        }
    };
}

// ─── Requirement attributes ──────────────────────────────────────────

/// Inherent risk level assigned to a requirement by its framework.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

wire_format!(RiskLevel, "risk level", {
    Low => "low",
    Medium => "medium",
    High => "high",
    Critical => "critical",
});

/// How binding a requirement is within its framework.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplianceObligation {
    Mandatory,
    Recommended,
    Optional,
}

wire_format!(ComplianceObligation, "compliance obligation", {
    Mandatory => "mandatory",
    Recommended => "recommended",
    Optional => "optional",
});

// ─── Mapping attributes ──────────────────────────────────────────────

/// Strength of a semantic relationship between two requirements.
///
/// Ordered from strongest to weakest. `WeakRelation` is never produced by
/// automated detection; it exists for manually curated mappings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MappingType {
    /// Similarity ≥ 0.95: the requirements state the same control.
    Equivalent,
    /// Similarity ≥ 0.85.
    Similar,
    /// Similarity ≥ 0.75.
    Related,
    /// Below the automated threshold; manual records only.
    WeakRelation,
}

wire_format!(MappingType, "mapping type", {
    Equivalent => "equivalent",
    Similar => "similar",
    Related => "related",
    WeakRelation => "weak_relation",
});

impl MappingType {
    /// Lower similarity bound of the `Equivalent` tier.
    pub const EQUIVALENT_FLOOR: f64 = 0.95;
    /// Lower similarity bound of the `Similar` tier.
    pub const SIMILAR_FLOOR: f64 = 0.85;
    /// Lower similarity bound of the `Related` tier.
    pub const RELATED_FLOOR: f64 = 0.75;

    /// The tier a similarity score falls into. Scores below the `Related`
    /// floor (including NaN) map to `WeakRelation`.
    pub fn for_similarity(score: f64) -> Self {
        if score >= Self::EQUIVALENT_FLOOR {
            Self::Equivalent
        } else if score >= Self::SIMILAR_FLOOR {
            Self::Similar
        } else if score >= Self::RELATED_FLOOR {
            Self::Related
        } else {
            Self::WeakRelation
        }
    }

    /// All mapping types, strongest first.
    pub fn all() -> &'static [MappingType] {
        &[
            Self::Equivalent,
            Self::Similar,
            Self::Related,
            Self::WeakRelation,
        ]
    }
}

/// Review state of a mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationStatus {
    /// Awaiting human review (initial state).
    Pending,
    /// Accepted; participates in cross-mapped coverage.
    Approved,
    /// Refused; ignored by coverage.
    Rejected,
}

wire_format!(ValidationStatus, "validation status", {
    Pending => "pending",
    Approved => "approved",
    Rejected => "rejected",
});

impl ValidationStatus {
    /// Whether a decision has been recorded.
    pub fn is_decided(&self) -> bool {
        matches!(self, Self::Approved | Self::Rejected)
    }
}

/// Who created a mapping record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MappingCreator {
    /// The mapping detector.
    Automated,
    /// A reviewer, through the validation UI.
    Human,
}

wire_format!(MappingCreator, "mapping creator", {
    Automated => "automated",
    Human => "human",
});

// ─── Coverage ────────────────────────────────────────────────────────

/// Strategy used to compute a coverage figure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoverageMethod {
    Direct,
    CrossMapped,
    Hybrid,
}

wire_format!(CoverageMethod, "coverage method", {
    Direct => "direct",
    CrossMapped => "cross_mapped",
    Hybrid => "hybrid",
});
