//! Append-only case event trail
//!
//! Every state transition, reminder dispatch, filing submission, callback
//! and payment produces exactly one event. Events are never updated or
//! deleted; they are the audit record for a case.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::{CaseId, EventId};

/// The kind of action an event records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// Collection tracking opened for an invoice
    CaseInitialized,
    /// Status advanced without correspondence (e.g. Current -> Overdue)
    StatusChanged,
    /// A reminder letter was dispatched (level in payload)
    ReminderSent,
    /// The formal notice was dispatched
    FormalNoticeSent,
    /// The enforcement filing was handed to the enforcement integration
    FilingInitiated,
    /// External submission failed; the filing awaits retry or manual handling
    FilingSubmissionFailed,
    /// An enforcement-authority callback was applied to the case
    CallbackApplied,
    /// The debtor filed opposition; operator action required
    OppositionAlert,
    /// Continuation of the enforcement procedure was requested
    ContinuationRequested,
    /// A payment was recorded against the case
    PaymentRecorded,
    CaseSuspended,
    CaseResumed,
    DebtWrittenOff,
}

/// One entry in a case's audit trail
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseEvent {
    pub id: EventId,
    pub case_id: CaseId,
    pub kind: EventKind,
    pub payload: serde_json::Value,
    pub timestamp: DateTime<Utc>,
}

impl CaseEvent {
    /// Creates a new event stamped with the current time
    pub fn new(case_id: CaseId, kind: EventKind, payload: serde_json::Value) -> Self {
        Self {
            id: EventId::new(),
            case_id,
            kind,
            payload,
            timestamp: Utc::now(),
        }
    }
}
