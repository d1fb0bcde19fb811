//! # Identifier Newtypes
//!
//! Every record kind in the mapping engine has its own UUID newtype so that
//! identifiers from different namespaces cannot be confused. A validator id
//! cannot be stored as a mapping id; a framework id cannot be used to look
//! up a requirement.
//!
//! All identifiers serialize transparently as the bare UUID string and
//! order by their UUID value, which the mapping de-duplication relies on
//! to build a canonical `(min, max)` pair key.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::XrefError;

macro_rules! uuid_identifier {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Generate a new random identifier.
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Wrap an existing UUID.
            pub fn from_uuid(id: Uuid) -> Self {
                Self(id)
            }

            /// Access the inner UUID.
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, concat!($prefix, ":{}"), self.0)
            }
        }

        impl FromStr for $name {
            type Err = XrefError;

            /// Parse from a bare UUID or the prefixed `Display` form.
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let raw = s.strip_prefix(concat!($prefix, ":")).unwrap_or(s);
                Uuid::parse_str(raw)
                    .map(Self)
                    .map_err(|e| XrefError::InvalidIdentifier {
                        value: s.to_string(),
                        reason: e.to_string(),
                    })
            }
        }
    };
}

uuid_identifier!(
    /// Unique identifier for a compliance framework (ISO 27001, EBIOS RM, ...).
    FrameworkId,
    "framework"
);

uuid_identifier!(
    /// Unique identifier for a single requirement within a framework.
    RequirementId,
    "requirement"
);

uuid_identifier!(
    /// Unique identifier for a cross-framework requirement mapping.
    MappingId,
    "mapping"
);

uuid_identifier!(
    /// Unique identifier for an audit whose answers feed coverage.
    AuditId,
    "audit"
);

uuid_identifier!(
    /// Identity of the person or service that validated a mapping.
    ValidatorId,
    "validator"
);

uuid_identifier!(
    /// Unique identifier for a persisted coverage snapshot.
    SnapshotId,
    "snapshot"
);
