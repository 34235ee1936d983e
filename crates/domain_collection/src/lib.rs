//! Collection domain
//!
//! Statutory debt-collection workflow: per-invoice cases escalate through
//! reminders and the formal notice up to the enforcement filing, accruing
//! moratory interest and step fees along the way.
//!
//! Case lifecycle:
//!
//! ```text
//! Current -> Overdue -> Reminder1 -> Reminder2 -> FormalNotice
//!     -> { Collection | EnforcementFiled } -> Paid
//! ```
//!
//! with `Suspended` reachable from any non-terminal state and `WrittenOff`
//! as the bad-debt terminal. The scheduled [`EscalationEngine`] advances
//! cases at most one step per run; [`PaymentLedger`] handles settlement,
//! suspension and write-off; [`ReportingService`] serves the read side.
//! External collaborators (store, correspondence, ledger, invoicing,
//! enforcement) are reached through the traits in [`ports`].

pub mod calculator;
pub mod case;
pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod payments;
pub mod ports;
pub mod reporting;

pub use calculator::{
    assess_rate, moratory_interest, FeeBracket, FeeSchedule, RateAssessment,
    SCRUTINY_RATE_PERCENT, STATUTORY_RATE_PERCENT, USURY_RATE_PERCENT,
};
pub use case::{CaseStatus, CollectionCase};
pub use config::{WorkflowConfig, WorkflowConfigRegistry};
pub use engine::{CycleFailure, CycleSummary, EscalationEngine, NewCase, TransitionRecord};
pub use error::CollectionError;
pub use events::{CaseEvent, EventKind};
pub use payments::{
    Payment, PaymentLedger, PaymentMethod, PaymentOutcome, BAD_DEBT_ACCOUNT, RECEIVABLES_ACCOUNT,
};
pub use ports::{
    CaseRepository, CorrespondenceSender, EnforcementInitiator, InvoiceGateway, LedgerPoster,
    TemplateKind,
};
pub use reporting::{
    AgingBucket, AgingLine, AgingReport, DashboardSummary, DebtorExposure, ReportingService,
};
