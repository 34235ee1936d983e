//! Collection domain ports
//!
//! The domain depends on these traits only; adapters live elsewhere
//! (the in-memory store, the notification service client, the ledger
//! bridge, the enforcement integration).

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use core_kernel::{CaseId, DebtorId, DomainPort, InvoiceId, Money, OwnerEntity, PortError};

use crate::case::{CaseStatus, CollectionCase};
use crate::events::CaseEvent;
use crate::payments::Payment;

/// Correspondence template kinds the notification collaborator renders
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateKind {
    Reminder1,
    Reminder2,
    FormalNotice,
}

/// Durable storage for collection cases, events and payments
///
/// Updates use optimistic versioning: `update_case` persists only when the
/// stored version equals `expected_version` and bumps it by one, otherwise
/// it fails with `VersionConflict`. This is the per-case serialization the
/// scheduler and the callback channel both rely on; a conflicting writer
/// skips the case and picks it up next cycle.
#[async_trait]
pub trait CaseRepository: DomainPort {
    async fn insert_case(&self, case: CollectionCase) -> Result<(), PortError>;

    async fn case(&self, id: CaseId) -> Result<CollectionCase, PortError>;

    /// Finds the case tracking an invoice, if any (init is idempotent on this)
    async fn case_by_invoice(&self, invoice_id: InvoiceId)
        -> Result<Option<CollectionCase>, PortError>;

    async fn update_case(
        &self,
        case: &CollectionCase,
        expected_version: u64,
    ) -> Result<(), PortError>;

    /// Non-terminal, non-suspended cases whose `next_action_at` has arrived
    async fn cases_due(
        &self,
        owner: Option<&OwnerEntity>,
        today: NaiveDate,
    ) -> Result<Vec<CollectionCase>, PortError>;

    /// Cases for an owning entity, optionally filtered by status
    async fn cases_by_status(
        &self,
        owner: &OwnerEntity,
        status: Option<CaseStatus>,
    ) -> Result<Vec<CollectionCase>, PortError>;

    /// All non-terminal cases, optionally restricted to one owning entity
    async fn open_cases(&self, owner: Option<&OwnerEntity>)
        -> Result<Vec<CollectionCase>, PortError>;

    async fn append_event(&self, event: CaseEvent) -> Result<(), PortError>;

    async fn events_for(&self, case_id: CaseId) -> Result<Vec<CaseEvent>, PortError>;

    async fn append_payment(&self, payment: Payment) -> Result<(), PortError>;

    async fn payments_for(&self, case_id: CaseId) -> Result<Vec<Payment>, PortError>;
}

/// Sends templated correspondence to a debtor
///
/// The notification collaborator owns address resolution and rendering;
/// the domain hands over the debtor identity, the template kind and the
/// template variables. Failure means the letter was not dispatched and the
/// escalation step must not be persisted.
#[async_trait]
pub trait CorrespondenceSender: DomainPort {
    async fn send(
        &self,
        debtor_id: DebtorId,
        template: TemplateKind,
        variables: serde_json::Value,
    ) -> Result<(), PortError>;
}

/// Posts a bookkeeping instruction to the external ledger
#[async_trait]
pub trait LedgerPoster: DomainPort {
    async fn post_entry(
        &self,
        debit_account: &str,
        credit_account: &str,
        amount: Money,
        reference: &str,
    ) -> Result<(), PortError>;
}

/// Notifies the invoicing system that an invoice is settled
#[async_trait]
pub trait InvoiceGateway: DomainPort {
    async fn mark_settled(&self, invoice_id: InvoiceId) -> Result<(), PortError>;
}

/// Hands a case over to the statutory enforcement integration
///
/// `initiate_filing` must absorb external submission failures: the
/// enforcement side records the failure and retries on its own schedule,
/// so the parent case transition to `EnforcementFiled` never fails because
/// the authority was unreachable. An error from this port means the filing
/// could not even be recorded locally.
#[async_trait]
pub trait EnforcementInitiator: DomainPort {
    async fn initiate_filing(&self, case: &CollectionCase) -> Result<(), PortError>;

    /// Re-attempts submission for a filing still awaiting acknowledgement
    async fn retry_pending(&self, case_id: CaseId) -> Result<(), PortError>;
}
