//! # xref-coverage — Cross-Referential Coverage
//!
//! Answers "how much of framework F does this audit cover?" three ways:
//!
//! - **direct**: requirements of F answered compliant in the audit;
//! - **cross-mapped**: requirements of F reached by an approved mapping
//!   (similarity at least `coverage_min_similarity`) from a compliant
//!   requirement of another framework;
//! - **hybrid**: the larger of the two, without double counting.
//!
//! Missing answers are normal for an audit in progress and produce zero
//! coverage, never an error. Every computation appends snapshots; the
//! newest per (audit, framework, method) is authoritative.

pub mod answers;
pub mod calculator;
pub mod error;
pub mod service;
pub mod snapshot;

pub use answers::{AnswerSource, MemoryAnswerSource};
pub use calculator::{
    cross_mapped_coverage, direct_coverage, hybrid_coverage, percentage, CoverageCounts,
    CrossMapRule, HybridCoverage,
};
pub use error::CoverageError;
pub use service::{
    summarize, AuditComparison, AuditCoverage, CoverageHistoryEntry, CoverageService,
    CoverageSummary, FrameworkComparison, FrameworkCoverage,
};
pub use snapshot::{MemorySnapshotStore, SnapshotStore};
