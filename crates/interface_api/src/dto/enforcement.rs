//! Enforcement DTOs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use core_kernel::{CaseId, EnforcementCaseId};
use domain_enforcement::{EnforcementCase, EnforcementStatus};

#[derive(Debug, Deserialize)]
pub struct ContinuationRequest {
    /// Decision date for the peremption guard; defaults to today
    pub as_of: Option<NaiveDate>,
}

#[derive(Debug, Serialize)]
pub struct FilingResponse {
    pub id: EnforcementCaseId,
    pub case_id: CaseId,
    pub office_code: String,
    pub claim_amount: Decimal,
    pub statutory_fee: Decimal,
    pub status: EnforcementStatus,
    pub external_reference: Option<String>,
    pub notified_at: Option<NaiveDate>,
    pub opposition_deadline: Option<NaiveDate>,
    pub payment_deadline: Option<NaiveDate>,
    pub peremption_date: Option<NaiveDate>,
    pub submission_attempts: u32,
    pub last_submission_error: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<&EnforcementCase> for FilingResponse {
    fn from(filing: &EnforcementCase) -> Self {
        Self {
            id: filing.id,
            case_id: filing.case_id,
            office_code: filing.office_code.clone(),
            claim_amount: filing.claim_amount.amount(),
            statutory_fee: filing.statutory_fee.amount(),
            status: filing.status,
            external_reference: filing.external_reference.clone(),
            notified_at: filing.notified_at,
            opposition_deadline: filing.opposition_deadline,
            payment_deadline: filing.payment_deadline,
            peremption_date: filing.peremption_date,
            submission_attempts: filing.submission_attempts,
            last_submission_error: filing.last_submission_error.clone(),
            created_at: filing.created_at,
        }
    }
}
