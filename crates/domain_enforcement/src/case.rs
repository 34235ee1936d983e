//! Enforcement case aggregate
//!
//! One `EnforcementCase` per authority filing, linked to its parent
//! collection case. The aggregate tracks the filing's progress at the
//! enforcement office and the legal deadlines that start running once the
//! payment order is notified to the debtor: 10 days to file opposition,
//! 20 days to pay, and one year before the right to continue the procedure
//! lapses (art. 88 SchKG).

use chrono::{DateTime, Duration, Months, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::{CaseId, DebtorId, EnforcementCaseId, Money};

use crate::error::EnforcementError;

/// Days the debtor has to file opposition after notification
pub const OPPOSITION_WINDOW_DAYS: i64 = 10;
/// Days the debtor has to pay after notification
pub const PAYMENT_WINDOW_DAYS: i64 = 20;
/// Months until the right to request continuation lapses
pub const PEREMPTION_MONTHS: u32 = 12;

/// Progress of a filing at the enforcement authority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnforcementStatus {
    /// Recorded locally, not yet acknowledged by the authority
    PendingSubmission,
    /// Accepted into the authority's intake queue
    Submitted,
    /// The authority validated the requisition
    Accepted,
    /// The payment order was issued
    FilingIssued,
    /// The payment order was served on the debtor; deadlines run from here
    FilingNotified,
    /// The debtor filed opposition within the window
    OppositionFiled,
    /// Payment arrived through the authority
    PaymentReceived,
    /// Continuation of the procedure was requested
    ContinuationRequested,
    /// Electronic submission failed permanently; paper filing required
    ManualFilingRequired,
    /// The procedure concluded
    Completed,
    /// The continuation window lapsed without action
    Expired,
}

impl EnforcementStatus {
    /// Returns true for states that end the filing's lifecycle
    pub fn is_terminal(&self) -> bool {
        matches!(self, EnforcementStatus::Completed | EnforcementStatus::Expired)
    }
}

/// Durable record of one authority filing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnforcementCase {
    pub id: EnforcementCaseId,
    /// Parent collection case
    pub case_id: CaseId,
    pub debtor_id: DebtorId,
    /// Enforcement-office code handling the filing (e.g. `GE01`)
    pub office_code: String,
    /// Claim amount as filed: principal plus interest and fees at filing time
    pub claim_amount: Money,
    /// Statutory filing fee from the federal tariff
    pub statutory_fee: Money,
    pub status: EnforcementStatus,
    /// Reference assigned by the authority on acknowledgement
    pub external_reference: Option<String>,
    /// When the payment order was served on the debtor
    pub notified_at: Option<NaiveDate>,
    pub opposition_deadline: Option<NaiveDate>,
    pub payment_deadline: Option<NaiveDate>,
    /// Continuation must be requested before this date (art. 88 SchKG)
    pub peremption_date: Option<NaiveDate>,
    /// Electronic submission attempts so far
    pub submission_attempts: u32,
    pub last_submission_error: Option<String>,
    /// Optimistic concurrency version, bumped on every persisted update
    pub version: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl EnforcementCase {
    /// Opens a filing record in `PendingSubmission`
    ///
    /// # Errors
    ///
    /// Returns `Validation` if the claim amount is not strictly positive.
    pub fn new(
        case_id: CaseId,
        debtor_id: DebtorId,
        office_code: impl Into<String>,
        claim_amount: Money,
        statutory_fee: Money,
    ) -> Result<Self, EnforcementError> {
        if !claim_amount.is_positive() {
            return Err(EnforcementError::Validation(format!(
                "claim amount must be positive, got {claim_amount}"
            )));
        }

        let now = Utc::now();
        Ok(Self {
            id: EnforcementCaseId::new(),
            case_id,
            debtor_id,
            office_code: office_code.into(),
            claim_amount,
            statutory_fee,
            status: EnforcementStatus::PendingSubmission,
            external_reference: None,
            notified_at: None,
            opposition_deadline: None,
            payment_deadline: None,
            peremption_date: None,
            submission_attempts: 0,
            last_submission_error: None,
            version: 0,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Checks whether a transition is permitted by the state machine
    pub fn can_transition_to(&self, target: EnforcementStatus) -> bool {
        use EnforcementStatus::*;

        if self.status == target {
            return false;
        }

        matches!(
            (self.status, target),
            (PendingSubmission, Submitted)
                | (PendingSubmission, ManualFilingRequired)
                | (ManualFilingRequired, Submitted)
                | (Submitted, Accepted)
                | (Submitted, FilingIssued)
                | (Accepted, FilingIssued)
                | (FilingIssued, FilingNotified)
                | (FilingNotified, OppositionFiled)
                | (FilingNotified, PaymentReceived)
                | (FilingNotified, ContinuationRequested)
                | (FilingNotified, Expired)
                | (OppositionFiled, PaymentReceived)
                | (OppositionFiled, ContinuationRequested)
                | (OppositionFiled, Expired)
                | (ContinuationRequested, PaymentReceived)
                | (ContinuationRequested, Completed)
                | (ContinuationRequested, Expired)
                | (PaymentReceived, Completed)
        )
    }

    /// Advances the filing status
    ///
    /// # Errors
    ///
    /// Returns `InvalidStatusTransition` if the state machine forbids it.
    pub fn transition_to(&mut self, target: EnforcementStatus) -> Result<(), EnforcementError> {
        if !self.can_transition_to(target) {
            return Err(EnforcementError::InvalidStatusTransition {
                from: format!("{:?}", self.status),
                to: format!("{:?}", target),
            });
        }
        self.status = target;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Records service of the payment order and starts the legal deadlines
    ///
    /// The opposition and payment windows and the peremption date are all
    /// anchored on the notification date, never on the processing date.
    pub fn record_notification(&mut self, notified_at: NaiveDate) -> Result<(), EnforcementError> {
        self.transition_to(EnforcementStatus::FilingNotified)?;
        self.notified_at = Some(notified_at);
        self.opposition_deadline = Some(notified_at + Duration::days(OPPOSITION_WINDOW_DAYS));
        self.payment_deadline = Some(notified_at + Duration::days(PAYMENT_WINDOW_DAYS));
        self.peremption_date = notified_at.checked_add_months(Months::new(PEREMPTION_MONTHS));
        Ok(())
    }

    /// Records a failed electronic submission attempt
    pub fn record_submission_failure(&mut self, error: impl Into<String>) {
        self.submission_attempts += 1;
        self.last_submission_error = Some(error.into());
        self.updated_at = Utc::now();
    }

    /// Records acknowledgement by the authority
    pub fn record_submission(&mut self, reference: impl Into<String>) -> Result<(), EnforcementError> {
        self.transition_to(EnforcementStatus::Submitted)?;
        self.submission_attempts += 1;
        self.external_reference = Some(reference.into());
        self.last_submission_error = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_kernel::Currency;
    use rust_decimal_macros::dec;

    fn filing() -> EnforcementCase {
        EnforcementCase::new(
            CaseId::new(),
            DebtorId::new(),
            "GE01",
            Money::new(dec!(16365.24), Currency::CHF),
            Money::new(dec!(128), Currency::CHF),
        )
        .unwrap()
    }

    #[test]
    fn test_new_filing_pending_submission() {
        let f = filing();
        assert_eq!(f.status, EnforcementStatus::PendingSubmission);
        assert!(f.external_reference.is_none());
        assert_eq!(f.submission_attempts, 0);
    }

    #[test]
    fn test_notification_starts_all_deadlines() {
        let mut f = filing();
        f.record_submission("LP-2025-001234").unwrap();
        f.transition_to(EnforcementStatus::FilingIssued).unwrap();

        let served = NaiveDate::from_ymd_opt(2025, 4, 10).unwrap();
        f.record_notification(served).unwrap();

        assert_eq!(f.status, EnforcementStatus::FilingNotified);
        assert_eq!(
            f.opposition_deadline,
            NaiveDate::from_ymd_opt(2025, 4, 20)
        );
        assert_eq!(f.payment_deadline, NaiveDate::from_ymd_opt(2025, 4, 30));
        assert_eq!(f.peremption_date, NaiveDate::from_ymd_opt(2026, 4, 10));
    }

    #[test]
    fn test_cannot_notify_before_issue() {
        let mut f = filing();
        let served = NaiveDate::from_ymd_opt(2025, 4, 10).unwrap();
        assert!(matches!(
            f.record_notification(served),
            Err(EnforcementError::InvalidStatusTransition { .. })
        ));
    }

    #[test]
    fn test_manual_filing_can_be_resubmitted() {
        let mut f = filing();
        f.record_submission_failure("gateway timeout");
        f.transition_to(EnforcementStatus::ManualFilingRequired)
            .unwrap();
        assert_eq!(f.submission_attempts, 1);

        f.record_submission("LP-2025-000777").unwrap();
        assert_eq!(f.status, EnforcementStatus::Submitted);
        assert!(f.last_submission_error.is_none());
    }

    #[test]
    fn test_terminal_states() {
        assert!(EnforcementStatus::Completed.is_terminal());
        assert!(EnforcementStatus::Expired.is_terminal());
        assert!(!EnforcementStatus::ManualFilingRequired.is_terminal());
        assert!(!EnforcementStatus::OppositionFiled.is_terminal());
    }

    #[test]
    fn test_rejects_non_positive_claim() {
        let result = EnforcementCase::new(
            CaseId::new(),
            DebtorId::new(),
            "GE01",
            Money::zero(Currency::CHF),
            Money::new(dec!(10), Currency::CHF),
        );
        assert!(matches!(result, Err(EnforcementError::Validation(_))));
    }
}
