//! Strongly-typed identifiers for domain entities
//!
//! Using newtype wrappers around UUIDs provides type safety and prevents
//! accidental mixing of different identifier types. Identifiers are UUID v7
//! (time-ordered), so batch scans over freshly created cases stay roughly
//! chronological and ids are collision-free across owning entities.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

macro_rules! define_id {
    ($name:ident, $prefix:literal) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Creates a new time-ordered identifier (UUID v7)
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// Creates from an existing UUID
            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the underlying UUID
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }

            /// Returns the identifier prefix for display
            pub fn prefix() -> &'static str {
                $prefix
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}-{}", $prefix, self.0)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                // Strip prefix if present
                let uuid_str = s.strip_prefix(concat!($prefix, "-")).unwrap_or(s);
                Ok(Self(Uuid::parse_str(uuid_str)?))
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Uuid {
                id.0
            }
        }
    };
}

// Collection domain identifiers
define_id!(CaseId, "CASE");
define_id!(InvoiceId, "INV");
define_id!(DebtorId, "DBT");
define_id!(PaymentId, "PAY");
define_id!(EventId, "EVT");

// Enforcement domain identifiers
define_id!(EnforcementCaseId, "ENF");

/// Error produced when an owner-entity code fails validation
#[derive(Debug, Error, PartialEq, Eq)]
pub enum OwnerEntityError {
    #[error("Owner entity code must not be empty")]
    Empty,

    #[error("Owner entity code contains invalid characters: {0}")]
    InvalidCharacters(String),
}

/// The code of the group company that owns a receivable
///
/// The set of owning entities is configuration data, not a code-level enum,
/// so onboarding a new group company never requires a redeployment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnerEntity(String);

impl OwnerEntity {
    /// Creates an owner-entity code, normalizing to uppercase
    pub fn new(code: impl Into<String>) -> Result<Self, OwnerEntityError> {
        let code = code.into().trim().to_uppercase();
        if code.is_empty() {
            return Err(OwnerEntityError::Empty);
        }
        if !code.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(OwnerEntityError::InvalidCharacters(code));
        }
        Ok(Self(code))
    }

    /// Returns the code as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OwnerEntity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
