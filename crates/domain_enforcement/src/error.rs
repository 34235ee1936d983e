//! Enforcement domain errors

use chrono::NaiveDate;
use core_kernel::PortError;
use domain_collection::CollectionError;
use thiserror::Error;

/// Errors that can occur in the enforcement domain
#[derive(Debug, Error)]
pub enum EnforcementError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Enforcement case not found: {0}")]
    NotFound(String),

    #[error("Invalid enforcement transition from {from} to {to}")]
    InvalidStatusTransition { from: String, to: String },

    /// The statutory window for the requested act has closed; the claim must
    /// be filed anew
    #[error("Legal deadline expired on {deadline}")]
    LegalDeadlineExpired { deadline: NaiveDate },

    /// Continuation is blocked while the debtor's opposition stands
    #[error("Opposition pending on enforcement case {0}")]
    OppositionPending(String),

    /// A callback referenced a filing we do not know
    #[error("Unknown external reference: {0}")]
    UnknownReference(String),

    #[error("Concurrency conflict: {0}")]
    ConcurrencyConflict(String),

    #[error("External system unavailable: {service}")]
    ExternalUnavailable { service: String },

    #[error("External system rejected request: {service}: {message}")]
    ExternalRejected { service: String, message: String },

    /// A failure in the parent collection case while applying a callback
    #[error(transparent)]
    Collection(#[from] CollectionError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<PortError> for EnforcementError {
    fn from(err: PortError) -> Self {
        match err {
            PortError::NotFound { entity_type, id } => {
                EnforcementError::NotFound(format!("{entity_type} {id}"))
            }
            PortError::Validation { message } => EnforcementError::Validation(message),
            PortError::VersionConflict { message } => {
                EnforcementError::ConcurrencyConflict(message)
            }
            PortError::Rejected { service, message } => {
                EnforcementError::ExternalRejected { service, message }
            }
            e if e.is_transient() => EnforcementError::ExternalUnavailable {
                service: e.to_string(),
            },
            e => EnforcementError::Internal(e.to_string()),
        }
    }
}
