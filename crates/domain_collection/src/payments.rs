//! Payment ledger
//!
//! Append-only payment records plus the operations that settle, suspend,
//! resume or write off a case. Interest is frozen to the payment date
//! before the settlement comparison, never to "now".

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

use core_kernel::{CaseId, Money, PaymentId};

use crate::calculator::moratory_interest;
use crate::case::{CaseStatus, CollectionCase};
use crate::config::WorkflowConfigRegistry;
use crate::error::CollectionError;
use crate::events::{CaseEvent, EventKind};
use crate::ports::{CaseRepository, InvoiceGateway, LedgerPoster};

/// How a payment reached us
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    BankTransfer,
    DirectDebit,
    Cash,
    /// Collected through the enforcement authority
    EnforcementProceeds,
    Other,
}

/// An append-only payment record against a case
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    pub id: PaymentId,
    pub case_id: CaseId,
    pub amount: Money,
    pub paid_at: DateTime<Utc>,
    pub method: PaymentMethod,
    pub reference: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Payment {
    /// Creates a payment record
    pub fn new(
        case_id: CaseId,
        amount: Money,
        paid_at: DateTime<Utc>,
        method: PaymentMethod,
        reference: Option<String>,
    ) -> Self {
        Self {
            id: PaymentId::new(),
            case_id,
            amount,
            paid_at,
            method,
            reference,
            created_at: Utc::now(),
        }
    }
}

/// Outcome of recording a payment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentOutcome {
    pub case_id: CaseId,
    pub status: CaseStatus,
    pub total_paid: Money,
    pub total_due: Money,
    /// True when this payment settled the case
    pub settled: bool,
}

/// Ledger account debited on write-off (bad-debt expense)
pub const BAD_DEBT_ACCOUNT: &str = "6900";
/// Ledger account credited on write-off (trade receivables)
pub const RECEIVABLES_ACCOUNT: &str = "1100";

/// Settlement and lifecycle operations over the case store
///
/// All terminal or irreversible actions here (write-off) happen only on an
/// explicit call; the scheduled escalation cycle never triggers them as a
/// side effect.
pub struct PaymentLedger {
    repo: Arc<dyn CaseRepository>,
    ledger: Arc<dyn LedgerPoster>,
    invoices: Arc<dyn InvoiceGateway>,
    configs: WorkflowConfigRegistry,
}

impl PaymentLedger {
    pub fn new(
        repo: Arc<dyn CaseRepository>,
        ledger: Arc<dyn LedgerPoster>,
        invoices: Arc<dyn InvoiceGateway>,
        configs: WorkflowConfigRegistry,
    ) -> Self {
        Self {
            repo,
            ledger,
            invoices,
            configs,
        }
    }

    /// Records a payment and settles the case when it covers the total due
    ///
    /// Interest is recomputed up to the payment date before comparison.
    /// Overpayment is recorded as-is; partial payment leaves the status
    /// unchanged and does not pause escalation.
    pub async fn record_payment(
        &self,
        case_id: CaseId,
        amount: Money,
        paid_at: DateTime<Utc>,
        method: PaymentMethod,
        reference: Option<String>,
    ) -> Result<PaymentOutcome, CollectionError> {
        if !amount.is_positive() {
            return Err(CollectionError::Validation(format!(
                "payment amount must be positive, got {amount}"
            )));
        }

        let mut case = self.repo.case(case_id).await?;
        if case.is_terminal() {
            return Err(CollectionError::CaseClosed(case_id.to_string()));
        }
        let expected_version = case.version;

        // Freeze interest to the payment date, not to "now"
        let days = case.days_overdue(paid_at.date_naive()).max(0) as u32;
        let config = self.configs.config_for(&case.owner_entity);
        let interest = moratory_interest(case.principal(), config.effective_rate(), days);
        if interest.amount() > case.accrued_interest().amount() {
            case.accrue_interest(interest)?;
        }

        let payment = Payment::new(case_id, amount, paid_at, method, reference);
        self.repo.append_payment(payment).await?;

        let total_paid = self
            .repo
            .payments_for(case_id)
            .await?
            .iter()
            .try_fold(Money::zero(amount.currency()), |acc, p| {
                acc.checked_add(&p.amount)
            })?;
        case.paid_amount = total_paid;

        let total_due = case.total_due();
        let settled = total_paid.amount() >= total_due.amount();
        if settled {
            case.mark_paid()?;
        }

        self.repo.update_case(&case, expected_version).await?;
        self.repo
            .append_event(CaseEvent::new(
                case_id,
                EventKind::PaymentRecorded,
                json!({
                    "amount": amount.amount(),
                    "total_paid": total_paid.amount(),
                    "total_due": total_due.amount(),
                    "is_fully_paid": settled,
                }),
            ))
            .await?;

        if settled {
            self.invoices.mark_settled(case.invoice_id).await?;
            tracing::info!(case_id = %case_id, invoice_id = %case.invoice_id, "case settled");
        }

        Ok(PaymentOutcome {
            case_id,
            status: case.status,
            total_paid,
            total_due,
            settled,
        })
    }

    /// Irreversibly writes the receivable off
    ///
    /// Posts the bad-debt instruction (debit 6900, credit 1100) for the
    /// outstanding amount at the moment of write-off.
    pub async fn write_off(
        &self,
        case_id: CaseId,
        reason: impl Into<String>,
    ) -> Result<(), CollectionError> {
        let reason = reason.into();
        let mut case = self.repo.case(case_id).await?;
        if case.is_terminal() {
            return Err(CollectionError::CaseClosed(case_id.to_string()));
        }
        let expected_version = case.version;

        let outstanding = case.outstanding()?;
        self.ledger
            .post_entry(
                BAD_DEBT_ACCOUNT,
                RECEIVABLES_ACCOUNT,
                outstanding,
                &case.invoice_id.to_string(),
            )
            .await?;

        case.write_off()?;
        self.repo.update_case(&case, expected_version).await?;
        self.repo
            .append_event(CaseEvent::new(
                case_id,
                EventKind::DebtWrittenOff,
                json!({ "reason": reason, "amount": outstanding.amount() }),
            ))
            .await?;

        tracing::warn!(case_id = %case_id, amount = %outstanding, "receivable written off");
        Ok(())
    }

    /// Excludes the case from scheduled runs until resumed
    pub async fn suspend(
        &self,
        case_id: CaseId,
        reason: impl Into<String>,
    ) -> Result<(), CollectionError> {
        let reason = reason.into();
        let mut case = self.repo.case(case_id).await?;
        let expected_version = case.version;

        case.suspend(reason.clone())?;
        self.repo.update_case(&case, expected_version).await?;
        self.repo
            .append_event(CaseEvent::new(
                case_id,
                EventKind::CaseSuspended,
                json!({ "reason": reason }),
            ))
            .await?;
        Ok(())
    }

    /// Restores a suspended case to its pre-suspension status
    pub async fn resume(&self, case_id: CaseId, today: NaiveDate) -> Result<(), CollectionError> {
        let mut case = self.repo.case(case_id).await?;
        let expected_version = case.version;

        case.resume(today)?;
        self.repo.update_case(&case, expected_version).await?;
        self.repo
            .append_event(CaseEvent::new(case_id, EventKind::CaseResumed, json!({})))
            .await?;
        Ok(())
    }
}
