//! Default outbound adapters
//!
//! Stand-ins for the environments where the real integrations (the
//! notification service, the ERP ledger, the e-filing gateway) are not
//! wired up. Correspondence, ledger entries and invoice updates are logged
//! as dispatched; filing submissions report the gateway as unavailable, so
//! filings queue as pending and fall back to paper handling, exactly as
//! they do when the live gateway is down.

use async_trait::async_trait;

use core_kernel::{DebtorId, DomainPort, InvoiceId, Money, PortError};
use domain_collection::{CorrespondenceSender, InvoiceGateway, LedgerPoster, TemplateKind};
use domain_enforcement::{DebtorDirectory, FilingPayload, FilingSubmitter, SubmissionAck};

/// Logs correspondence instead of dispatching it
pub struct LoggingCorrespondence;

impl DomainPort for LoggingCorrespondence {}

#[async_trait]
impl CorrespondenceSender for LoggingCorrespondence {
    async fn send(
        &self,
        debtor_id: DebtorId,
        template: TemplateKind,
        variables: serde_json::Value,
    ) -> Result<(), PortError> {
        tracing::info!(
            debtor_id = %debtor_id,
            template = ?template,
            variables = %variables,
            "correspondence dispatched"
        );
        Ok(())
    }
}

/// Logs bookkeeping instructions instead of posting them
pub struct LoggingLedger;

impl DomainPort for LoggingLedger {}

#[async_trait]
impl LedgerPoster for LoggingLedger {
    async fn post_entry(
        &self,
        debit_account: &str,
        credit_account: &str,
        amount: Money,
        reference: &str,
    ) -> Result<(), PortError> {
        tracing::info!(
            debit = %debit_account,
            credit = %credit_account,
            amount = %amount,
            reference = %reference,
            "ledger entry posted"
        );
        Ok(())
    }
}

/// Logs invoice settlement notifications
pub struct LoggingInvoices;

impl DomainPort for LoggingInvoices {}

#[async_trait]
impl InvoiceGateway for LoggingInvoices {
    async fn mark_settled(&self, invoice_id: InvoiceId) -> Result<(), PortError> {
        tracing::info!(invoice_id = %invoice_id, "invoice marked settled");
        Ok(())
    }
}

/// Reports the e-filing gateway as unavailable
///
/// Filings stay in `PendingSubmission` and eventually flag for paper
/// handling, the same path taken when the live gateway is unreachable.
pub struct OfflineSubmitter;

impl DomainPort for OfflineSubmitter {}

#[async_trait]
impl FilingSubmitter for OfflineSubmitter {
    async fn submit(&self, payload: &FilingPayload) -> Result<SubmissionAck, PortError> {
        tracing::warn!(
            office = %payload.office_code,
            claim = %payload.claim_amount,
            "e-filing gateway not configured, submission deferred"
        );
        Err(PortError::ServiceUnavailable {
            service: "e-filing".to_string(),
        })
    }
}

/// Directory without address data; every filing routes to the default office
pub struct EmptyDirectory;

impl DomainPort for EmptyDirectory {}

#[async_trait]
impl DebtorDirectory for EmptyDirectory {
    async fn canton_for(&self, _debtor_id: DebtorId) -> Result<Option<String>, PortError> {
        Ok(None)
    }
}
