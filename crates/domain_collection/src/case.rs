//! Collection case aggregate
//!
//! One `CollectionCase` exists per invoice under tracking. The case carries
//! the escalation status, the accrued moratory interest and fees, and the
//! scheduler bookkeeping. Cases are never deleted; terminal states close
//! them while the event trail remains.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::{CaseId, DebtorId, InvoiceId, Money, OwnerEntity};
use crate::error::CollectionError;

/// Escalation status of a collection case
///
/// ```text
/// Current -> Overdue -> Reminder1 -> Reminder2 -> FormalNotice
///     -> { Collection | EnforcementFiled } -> Paid
/// ```
///
/// `Suspended` is reachable from any non-terminal state and resumes back to
/// the pre-suspension status; `WrittenOff` is terminal from any non-terminal
/// state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaseStatus {
    /// Invoice not yet past due
    Current,
    /// Past due, no action taken yet
    Overdue,
    /// First reminder sent
    Reminder1,
    /// Second reminder sent
    Reminder2,
    /// Formal notice (mise en demeure) sent
    FormalNotice,
    /// Manual collection; no further automated transitions
    Collection,
    /// Statutory enforcement filing initiated
    EnforcementFiled,
    /// Fully settled
    Paid,
    /// Receivable written off as bad debt
    WrittenOff,
    /// Excluded from scheduling until resumed
    Suspended,
}

impl CaseStatus {
    /// Returns true for states that end the case's lifecycle
    pub fn is_terminal(&self) -> bool {
        matches!(self, CaseStatus::Paid | CaseStatus::WrittenOff)
    }
}

/// Durable record of per-invoice collection state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionCase {
    /// Unique identifier
    pub id: CaseId,
    /// The invoice under tracking (one case per invoice)
    pub invoice_id: InvoiceId,
    /// Group company that owns the receivable
    pub owner_entity: OwnerEntity,
    /// The debtor
    pub debtor_id: DebtorId,
    /// Invoice amount, fixed at creation
    principal: Money,
    /// Moratory interest accrued to the last evaluation
    accrued_interest: Money,
    /// Reminder and notice fees accrued so far
    accrued_fees: Money,
    /// Sum of recorded payments
    pub paid_amount: Money,
    /// Current escalation status
    pub status: CaseStatus,
    /// Invoice due date; day offsets are measured from here
    pub due_date: NaiveDate,
    /// When the scheduler last acted on this case
    pub last_action_at: Option<DateTime<Utc>>,
    /// The scheduler's due-date for this case; None only in terminal states
    pub next_action_at: Option<NaiveDate>,
    /// Why the case is suspended, if it is
    pub suspended_reason: Option<String>,
    /// Status to restore on resume
    pub status_before_suspension: Option<CaseStatus>,
    /// Optimistic concurrency version, bumped on every persisted update
    pub version: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CollectionCase {
    /// Opens tracking for an invoice
    ///
    /// # Errors
    ///
    /// Returns `Validation` if the principal is not strictly positive.
    pub fn new(
        invoice_id: InvoiceId,
        owner_entity: OwnerEntity,
        debtor_id: DebtorId,
        principal: Money,
        due_date: NaiveDate,
    ) -> Result<Self, CollectionError> {
        if !principal.is_positive() {
            return Err(CollectionError::Validation(format!(
                "principal must be positive, got {principal}"
            )));
        }

        let now = Utc::now();
        let currency = principal.currency();

        Ok(Self {
            id: CaseId::new(),
            invoice_id,
            owner_entity,
            debtor_id,
            principal,
            accrued_interest: Money::zero(currency),
            accrued_fees: Money::zero(currency),
            paid_amount: Money::zero(currency),
            status: CaseStatus::Current,
            due_date,
            last_action_at: None,
            next_action_at: Some(due_date),
            suspended_reason: None,
            status_before_suspension: None,
            version: 0,
            created_at: now,
            updated_at: now,
        })
    }

    /// Returns the immutable principal
    pub fn principal(&self) -> Money {
        self.principal
    }

    /// Returns the accrued moratory interest
    pub fn accrued_interest(&self) -> Money {
        self.accrued_interest
    }

    /// Returns the accrued step fees
    pub fn accrued_fees(&self) -> Money {
        self.accrued_fees
    }

    /// Principal plus accrued interest and fees
    pub fn total_due(&self) -> Money {
        self.principal + self.accrued_interest + self.accrued_fees
    }

    /// Total due minus payments received
    ///
    /// # Errors
    ///
    /// Returns `UnbalancedState` if the outstanding amount is negative and
    /// the case is not settled; a negative balance on an open case means the
    /// books are wrong and must never be clamped to zero.
    pub fn outstanding(&self) -> Result<Money, CollectionError> {
        let outstanding = self.total_due() - self.paid_amount;
        if outstanding.is_negative() && self.status != CaseStatus::Paid {
            return Err(CollectionError::UnbalancedState(format!(
                "case {} has negative outstanding amount {outstanding}",
                self.id
            )));
        }
        Ok(outstanding)
    }

    /// Whole days past the due date; zero or negative means not overdue
    pub fn days_overdue(&self, today: NaiveDate) -> i64 {
        (today - self.due_date).num_days()
    }

    /// Returns true once the case has reached a terminal state
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Returns true while the case is excluded from scheduled runs
    pub fn is_suspended(&self) -> bool {
        self.status == CaseStatus::Suspended
    }

    /// Checks whether a transition is permitted by the state machine
    pub fn can_transition_to(&self, target: CaseStatus) -> bool {
        use CaseStatus::*;

        if self.status == target {
            return false;
        }

        matches!(
            (self.status, target),
            (Current, Overdue)
                | (Overdue, Reminder1)
                | (Reminder1, Reminder2)
                | (Reminder2, FormalNotice)
                | (FormalNotice, Collection)
                | (FormalNotice, EnforcementFiled)
        ) || match target {
            // Payments settle a case from any non-terminal state; suspension
            // freezes the scheduler, not the debtor's right to pay
            Paid => !self.status.is_terminal(),
            WrittenOff => !self.status.is_terminal(),
            Suspended => !self.status.is_terminal(),
            _ => false,
        }
    }

    /// Advances the escalation status
    ///
    /// # Errors
    ///
    /// Returns `InvalidStatusTransition` if the state machine forbids it.
    pub fn transition_to(&mut self, target: CaseStatus) -> Result<(), CollectionError> {
        if !self.can_transition_to(target) {
            return Err(CollectionError::InvalidStatusTransition {
                from: format!("{:?}", self.status),
                to: format!("{:?}", target),
            });
        }
        self.status = target;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Replaces the accrued interest with a figure recomputed to a later date
    ///
    /// # Errors
    ///
    /// Returns `UnbalancedState` if the new figure is lower than the current
    /// one: interest is monotonically non-decreasing while the case is active.
    pub fn accrue_interest(&mut self, interest: Money) -> Result<(), CollectionError> {
        if interest.amount() < self.accrued_interest.amount() {
            return Err(CollectionError::UnbalancedState(format!(
                "interest accrual may not decrease: {} -> {}",
                self.accrued_interest, interest
            )));
        }
        self.accrued_interest = interest;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Adds a step fee to the accrued fees
    ///
    /// # Errors
    ///
    /// Returns `UnbalancedState` on a negative fee.
    pub fn add_fee(&mut self, fee: Money) -> Result<(), CollectionError> {
        if fee.is_negative() {
            return Err(CollectionError::UnbalancedState(format!(
                "step fee may not be negative: {fee}"
            )));
        }
        self.accrued_fees = self.accrued_fees.checked_add(&fee)?;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Freezes scheduling for the case, remembering the pre-suspension status
    pub fn suspend(&mut self, reason: impl Into<String>) -> Result<(), CollectionError> {
        let previous = self.status;
        self.transition_to(CaseStatus::Suspended)?;
        self.status_before_suspension = Some(previous);
        self.suspended_reason = Some(reason.into());
        Ok(())
    }

    /// Restores the pre-suspension status and re-enables scheduling
    ///
    /// # Errors
    ///
    /// Returns `InvalidStatusTransition` if the case is not suspended.
    pub fn resume(&mut self, today: NaiveDate) -> Result<(), CollectionError> {
        if self.status != CaseStatus::Suspended {
            return Err(CollectionError::InvalidStatusTransition {
                from: format!("{:?}", self.status),
                to: "resumed".to_string(),
            });
        }
        self.status = self.status_before_suspension.take().unwrap_or(CaseStatus::Overdue);
        self.suspended_reason = None;
        // Eligible again on the next scheduled run
        self.next_action_at = Some(today);
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Marks the case settled, clearing any suspension bookkeeping
    pub fn mark_paid(&mut self) -> Result<(), CollectionError> {
        self.transition_to(CaseStatus::Paid)?;
        self.suspended_reason = None;
        self.status_before_suspension = None;
        self.next_action_at = None;
        Ok(())
    }

    /// Irreversibly writes the receivable off
    pub fn write_off(&mut self) -> Result<(), CollectionError> {
        self.transition_to(CaseStatus::WrittenOff)?;
        self.next_action_at = None;
        Ok(())
    }
}
