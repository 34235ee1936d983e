//! Collection case DTOs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

use core_kernel::{CaseId, Currency, DebtorId, InvoiceId};
use domain_collection::{CaseStatus, CollectionCase, PaymentMethod};

#[derive(Debug, Deserialize, Validate)]
pub struct CreateCaseRequest {
    pub invoice_id: InvoiceId,
    #[validate(length(min = 1, max = 64))]
    pub owner_entity: String,
    pub debtor_id: DebtorId,
    pub principal: Decimal,
    pub currency: Currency,
    pub due_date: NaiveDate,
}

#[derive(Debug, Deserialize)]
pub struct RecordPaymentRequest {
    pub amount: Decimal,
    pub paid_at: DateTime<Utc>,
    pub method: PaymentMethod,
    pub reference: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SuspendRequest {
    #[validate(length(min = 1, max = 500))]
    pub reason: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct WriteOffRequest {
    #[validate(length(min = 1, max = 500))]
    pub reason: String,
}

#[derive(Debug, Deserialize)]
pub struct RunCycleRequest {
    /// Restrict the run to one owning entity
    pub owner_entity: Option<String>,
    /// Evaluation date; defaults to today
    pub as_of: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct ListCasesQuery {
    pub owner_entity: String,
    pub status: Option<CaseStatus>,
}

#[derive(Debug, Deserialize)]
pub struct ReportQuery {
    pub owner_entity: Option<String>,
    pub as_of: Option<NaiveDate>,
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct CaseResponse {
    pub id: CaseId,
    pub invoice_id: InvoiceId,
    pub owner_entity: String,
    pub debtor_id: DebtorId,
    pub principal: Decimal,
    pub accrued_interest: Decimal,
    pub accrued_fees: Decimal,
    pub paid_amount: Decimal,
    pub total_due: Decimal,
    pub currency: Currency,
    pub status: CaseStatus,
    pub due_date: NaiveDate,
    pub next_action_at: Option<NaiveDate>,
    pub last_action_at: Option<DateTime<Utc>>,
    pub suspended_reason: Option<String>,
    pub version: u64,
    pub created_at: DateTime<Utc>,
}

impl From<&CollectionCase> for CaseResponse {
    fn from(case: &CollectionCase) -> Self {
        Self {
            id: case.id,
            invoice_id: case.invoice_id,
            owner_entity: case.owner_entity.to_string(),
            debtor_id: case.debtor_id,
            principal: case.principal().amount(),
            accrued_interest: case.accrued_interest().amount(),
            accrued_fees: case.accrued_fees().amount(),
            paid_amount: case.paid_amount.amount(),
            total_due: case.total_due().amount(),
            currency: case.principal().currency(),
            status: case.status,
            due_date: case.due_date,
            next_action_at: case.next_action_at,
            last_action_at: case.last_action_at,
            suspended_reason: case.suspended_reason.clone(),
            version: case.version,
            created_at: case.created_at,
        }
    }
}
