//! Electronic filing submission
//!
//! The requisition payload sent to the authority gateway and the outbound
//! port that carries it. Transient gateway failures leave the filing in
//! `PendingSubmission` for retry; a permanent rejection flags it for paper
//! filing instead of retrying a request the authority will never accept.

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use core_kernel::{DomainPort, PortError};

use crate::case::EnforcementCase;

/// Requisition payload for the authority gateway
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilingPayload {
    /// Enforcement-office routing code
    pub office_code: String,
    pub debtor_id: String,
    /// Claim amount in the filing currency
    pub claim_amount: Decimal,
    pub currency: String,
    /// Statutory fee accompanying the requisition
    pub statutory_fee: Decimal,
    /// Creditor's reference: the parent collection case
    pub creditor_reference: String,
    pub filing_date: NaiveDate,
}

impl FilingPayload {
    /// Builds the payload from a filing record
    pub fn from_case(case: &EnforcementCase, filing_date: NaiveDate) -> Self {
        Self {
            office_code: case.office_code.clone(),
            debtor_id: case.debtor_id.to_string(),
            claim_amount: case.claim_amount.amount(),
            currency: case.claim_amount.currency().code().to_string(),
            statutory_fee: case.statutory_fee.amount(),
            creditor_reference: case.case_id.to_string(),
            filing_date,
        }
    }
}

/// Acknowledgement returned by the authority gateway
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionAck {
    /// Reference the authority will use in all subsequent callbacks
    pub external_reference: String,
}

/// Outbound port to the authority's electronic filing gateway
#[async_trait]
pub trait FilingSubmitter: DomainPort {
    /// Submits a requisition
    ///
    /// # Errors
    ///
    /// Transient errors (`Connection`, `Timeout`, `ServiceUnavailable`) mean
    /// the submission may be retried as-is; `Rejected` means it never will
    /// succeed and the filing must go on paper.
    async fn submit(&self, payload: &FilingPayload) -> Result<SubmissionAck, PortError>;
}
