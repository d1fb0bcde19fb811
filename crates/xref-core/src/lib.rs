//! # xref-core — Foundational Types for Cross-Referential Mapping
//!
//! This crate is the leaf of the `xref` workspace. It defines the record
//! types shared by every stage of the pipeline (normalize → embed → index →
//! detect → validate → cover) and the deterministic text normalizer that
//! feeds the embedding generator.
//!
//! ## Key Design Principles
//!
//! 1. **Newtype identifiers.** `FrameworkId`, `RequirementId`, `MappingId`,
//!    `AuditId`, `ValidatorId`, `SnapshotId` are distinct UUID newtypes. A
//!    mapping id can never be passed where a requirement id is expected.
//!
//! 2. **Closed taxonomies.** Risk levels, obligations, mapping types,
//!    validation states and coverage methods are enums with a single
//!    snake_case wire form shared by serde, `Display` and `FromStr`.
//!
//! 3. **Deterministic normalization.** [`normalize_requirement`] is a pure
//!    function of the requirement record. Identical records always produce
//!    identical embedding input.
//!
//! 4. **UTC-only timestamps.** [`Timestamp`] is UTC with seconds precision.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `xref-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod error;
pub mod identity;
pub mod model;
pub mod normalize;
pub mod taxonomy;
pub mod temporal;

pub use error::XrefError;
pub use identity::{AuditId, FrameworkId, MappingId, RequirementId, SnapshotId, ValidatorId};
pub use model::{AnswerFact, CoverageSnapshot, Framework, Mapping, Requirement};
pub use normalize::normalize_requirement;
pub use taxonomy::{
    ComplianceObligation, CoverageMethod, MappingCreator, MappingType, RiskLevel,
    ValidationStatus,
};
pub use temporal::Timestamp;
