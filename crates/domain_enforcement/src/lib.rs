//! Enforcement domain
//!
//! Integration with the cantonal enforcement authorities: the filing
//! aggregate with its legal deadlines, the office routing table, the
//! electronic submission gateway with retry and paper fallback, and the
//! asynchronous callback channel that reports the authority's progress
//! back onto the parent collection case.
//!
//! Filing lifecycle:
//!
//! ```text
//! PendingSubmission -> Submitted -> Accepted -> FilingIssued
//!     -> FilingNotified -> { OppositionFiled | PaymentReceived
//!                            | ContinuationRequested } -> Completed
//! ```
//!
//! with `ManualFilingRequired` as the electronic-submission fallback and
//! `Expired` when the one-year continuation window lapses.

pub mod callbacks;
pub mod case;
pub mod error;
pub mod offices;
pub mod ports;
pub mod service;
pub mod submission;

pub use callbacks::{AuthorityCallback, CallbackKind, CallbackOutcome, CallbackProcessor};
pub use case::{
    EnforcementCase, EnforcementStatus, OPPOSITION_WINDOW_DAYS, PAYMENT_WINDOW_DAYS,
    PEREMPTION_MONTHS,
};
pub use error::EnforcementError;
pub use offices::{Office, OfficeRegistry};
pub use ports::{DebtorDirectory, EnforcementRepository};
pub use service::EnforcementService;
pub use submission::{FilingPayload, FilingSubmitter, SubmissionAck};
