//! Collection domain errors

use core_kernel::{MoneyError, PortError};
use thiserror::Error;

/// Errors that can occur in the collection domain
///
/// Errors are local to a single case: the escalation engine halts only the
/// failing case's evaluation for the cycle, never the whole batch.
#[derive(Debug, Error)]
pub enum CollectionError {
    /// Malformed invoice or case input, rejected before case creation
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Case not found: {0}")]
    CaseNotFound(String),

    #[error("Invalid status transition from {from} to {to}")]
    InvalidStatusTransition { from: String, to: String },

    /// Lock contention on a case; the caller retries next cycle
    #[error("Concurrency conflict: {0}")]
    ConcurrencyConflict(String),

    /// Transient external failure; the case is left in its prior state
    #[error("External system unavailable: {service}")]
    ExternalUnavailable { service: String },

    /// Permanent rejection by an external system; flagged for manual handling
    #[error("External system rejected request: {service}: {message}")]
    ExternalRejected { service: String, message: String },

    /// Invariant violation, e.g. a decreasing accrual or negative outstanding
    #[error("Unbalanced state: {0}")]
    UnbalancedState(String),

    /// Operation attempted on a terminal case
    #[error("Case is closed: {0}")]
    CaseClosed(String),

    #[error(transparent)]
    Money(#[from] MoneyError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<PortError> for CollectionError {
    fn from(err: PortError) -> Self {
        match err {
            PortError::NotFound { entity_type, id } => {
                CollectionError::CaseNotFound(format!("{entity_type} {id}"))
            }
            PortError::Validation { message } => CollectionError::Validation(message),
            PortError::VersionConflict { message } => CollectionError::ConcurrencyConflict(message),
            PortError::Rejected { service, message } => {
                CollectionError::ExternalRejected { service, message }
            }
            e if e.is_transient() => CollectionError::ExternalUnavailable {
                service: e.to_string(),
            },
            e => CollectionError::Internal(e.to_string()),
        }
    }
}
