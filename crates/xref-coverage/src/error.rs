//! Coverage errors.

use thiserror::Error;
use xref_core::FrameworkId;

/// Failures of the coverage service.
///
/// Missing or partial audit data is not an error: it yields zero coverage.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoverageError {
    #[error("framework {0} not found")]
    FrameworkNotFound(FrameworkId),

    /// The snapshot store rejected a write.
    #[error("snapshot store unavailable: {reason}")]
    SnapshotStore { reason: String },
}
