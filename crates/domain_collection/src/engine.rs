//! Escalation engine
//!
//! The scheduled state machine. A cycle scans all eligible cases for an
//! owning entity (or all entities) and evaluates each independently:
//! at most one transition per case per run, so each step's side effect
//! (a reminder, the formal notice, the filing hand-over) is actually
//! performed before the next step can be reached.
//!
//! Each transition is an atomic unit: side effect first, then fee,
//! interest recomputation, persist under the case's version check, one
//! event. If the side effect fails the case is left untouched and retried
//! on the next run (at-least-once side effects, exactly-once durable state
//! advance). A version conflict means another writer holds the case this
//! cycle; the engine skips it without blocking the batch.

use chrono::{Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

use core_kernel::{CaseId, DebtorId, InvoiceId, Money, OwnerEntity};

use crate::calculator::moratory_interest;
use crate::case::{CaseStatus, CollectionCase};
use crate::config::{WorkflowConfig, WorkflowConfigRegistry};
use crate::error::CollectionError;
use crate::events::{CaseEvent, EventKind};
use crate::ports::{CaseRepository, CorrespondenceSender, EnforcementInitiator, TemplateKind};

/// New-case input taken from the invoice record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCase {
    pub invoice_id: InvoiceId,
    pub owner_entity: OwnerEntity,
    pub debtor_id: DebtorId,
    pub principal: Money,
    pub due_date: NaiveDate,
}

/// One transition performed during a cycle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransitionRecord {
    pub case_id: CaseId,
    pub invoice_id: InvoiceId,
    pub from: CaseStatus,
    pub to: CaseStatus,
    pub days_overdue: i64,
    pub total_due: Money,
}

/// Summary of a scheduled run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CycleSummary {
    /// Cases examined
    pub processed: usize,
    /// Transitions performed, in evaluation order
    pub transitions: Vec<TransitionRecord>,
    /// Long-horizon cases whose interest was refreshed without a transition
    pub refreshed: usize,
    /// Cases skipped because another writer held them this cycle
    pub skipped_conflicts: usize,
    /// Per-case failures; each halts only its own case
    pub failures: Vec<CycleFailure>,
}

/// A single case's failure during a cycle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CycleFailure {
    pub case_id: CaseId,
    pub error: String,
}

/// The step the state machine decided to take for one case
enum Action {
    /// Advance without correspondence (Current -> Overdue)
    MarkOverdue,
    /// Send reminder 1 or 2
    Reminder(u8),
    FormalNotice,
    /// Branch outcome at FormalNotice: file or park in manual collection
    FileEnforcement,
    ManualCollection,
    /// Long-horizon refresh: interest + deadline check, not a transition
    Refresh,
    None,
}

/// The scheduled escalation state machine
pub struct EscalationEngine {
    repo: Arc<dyn CaseRepository>,
    correspondence: Arc<dyn CorrespondenceSender>,
    enforcement: Arc<dyn EnforcementInitiator>,
    configs: WorkflowConfigRegistry,
}

impl EscalationEngine {
    pub fn new(
        repo: Arc<dyn CaseRepository>,
        correspondence: Arc<dyn CorrespondenceSender>,
        enforcement: Arc<dyn EnforcementInitiator>,
        configs: WorkflowConfigRegistry,
    ) -> Self {
        Self {
            repo,
            correspondence,
            enforcement,
            configs,
        }
    }

    /// Opens collection tracking for an invoice; idempotent on the invoice
    ///
    /// Re-initializing an already tracked invoice returns the existing case
    /// unchanged.
    pub async fn init_case(&self, input: NewCase) -> Result<CollectionCase, CollectionError> {
        if let Some(existing) = self.repo.case_by_invoice(input.invoice_id).await? {
            return Ok(existing);
        }

        let case = CollectionCase::new(
            input.invoice_id,
            input.owner_entity,
            input.debtor_id,
            input.principal,
            input.due_date,
        )?;
        let case_id = case.id;
        self.repo.insert_case(case.clone()).await?;
        self.repo
            .append_event(CaseEvent::new(
                case_id,
                EventKind::CaseInitialized,
                json!({
                    "invoice_id": case.invoice_id,
                    "principal": case.principal().amount(),
                    "due_date": case.due_date,
                }),
            ))
            .await?;

        tracing::info!(case_id = %case_id, invoice_id = %case.invoice_id, "collection tracking opened");
        Ok(case)
    }

    /// Runs one scheduled escalation cycle
    ///
    /// Evaluates every due case for the owning entity (or for all entities
    /// when `owner` is `None`). Errors are collected per case; the batch
    /// always completes.
    pub async fn run_cycle(
        &self,
        owner: Option<&OwnerEntity>,
        today: NaiveDate,
    ) -> Result<CycleSummary, CollectionError> {
        let cases = self.repo.cases_due(owner, today).await?;
        let mut summary = CycleSummary::default();

        for case in cases {
            let case_id = case.id;
            summary.processed += 1;

            match self.evaluate_case(case, today).await {
                Ok(Evaluation::Transition(record)) => summary.transitions.push(record),
                Ok(Evaluation::Refreshed) => summary.refreshed += 1,
                Ok(Evaluation::NoAction) => {}
                Err(CollectionError::ConcurrencyConflict(_)) => {
                    summary.skipped_conflicts += 1;
                    tracing::debug!(case_id = %case_id, "case locked by concurrent writer, skipped");
                }
                Err(e) => {
                    tracing::warn!(case_id = %case_id, error = %e, "case evaluation failed");
                    summary.failures.push(CycleFailure {
                        case_id,
                        error: e.to_string(),
                    });
                }
            }
        }

        tracing::info!(
            processed = summary.processed,
            transitions = summary.transitions.len(),
            refreshed = summary.refreshed,
            skipped = summary.skipped_conflicts,
            failures = summary.failures.len(),
            "escalation cycle complete"
        );
        Ok(summary)
    }

    /// Evaluates a single case; at most one transition
    async fn evaluate_case(
        &self,
        mut case: CollectionCase,
        today: NaiveDate,
    ) -> Result<Evaluation, CollectionError> {
        let days_overdue = case.days_overdue(today);
        if days_overdue <= 0 {
            return Ok(Evaluation::NoAction);
        }

        let config = self.configs.config_for(&case.owner_entity).clone();
        let expected_version = case.version;
        let interest = moratory_interest(
            case.principal(),
            config.effective_rate(),
            days_overdue as u32,
        );

        let action = self.decide(&case, &config, days_overdue, interest);
        let from = case.status;

        let (target, event_kind, event_payload, template) = match action {
            Action::None => return Ok(Evaluation::NoAction),
            Action::Refresh => {
                return self
                    .refresh_long_horizon(case, interest, today, expected_version)
                    .await;
            }
            Action::MarkOverdue => (
                CaseStatus::Overdue,
                EventKind::StatusChanged,
                json!({ "from": from, "to": CaseStatus::Overdue, "days_overdue": days_overdue }),
                None,
            ),
            Action::Reminder(level) => (
                if level == 1 { CaseStatus::Reminder1 } else { CaseStatus::Reminder2 },
                EventKind::ReminderSent,
                json!({ "level": level, "days_overdue": days_overdue }),
                Some(if level == 1 { TemplateKind::Reminder1 } else { TemplateKind::Reminder2 }),
            ),
            Action::FormalNotice => (
                CaseStatus::FormalNotice,
                EventKind::FormalNoticeSent,
                json!({ "days_overdue": days_overdue }),
                Some(TemplateKind::FormalNotice),
            ),
            Action::FileEnforcement => (
                CaseStatus::EnforcementFiled,
                EventKind::FilingInitiated,
                json!({ "days_overdue": days_overdue }),
                None,
            ),
            Action::ManualCollection => (
                CaseStatus::Collection,
                EventKind::StatusChanged,
                json!({ "from": from, "to": CaseStatus::Collection, "days_overdue": days_overdue }),
                None,
            ),
        };

        // 1. Side effect; failure leaves the case untouched for retry
        if let Some(template) = template {
            let fee = match template {
                TemplateKind::Reminder1 => config.reminder_fee(1),
                TemplateKind::Reminder2 => config.reminder_fee(2),
                TemplateKind::FormalNotice => config.notice_fee(),
            };
            let variables = correspondence_variables(&case, &config, days_overdue, interest, fee);
            self.correspondence
                .send(case.debtor_id, template, variables)
                .await?;
        }

        // 2. Step fee
        let fee = match action {
            Action::Reminder(level) => Some(config.reminder_fee(level)),
            Action::FormalNotice => Some(config.notice_fee()),
            _ => None,
        };
        if let Some(fee) = fee {
            case.add_fee(fee)?;
        }

        // 3. Interest up to today
        case.accrue_interest(interest)?;

        // 4. Status, action timestamps, scheduler date
        case.transition_to(target)?;
        case.last_action_at = Some(Utc::now());
        case.next_action_at = Some(next_action_date(target, case.due_date, today, &config));

        // Hand-over to the enforcement integration; submission failures are
        // absorbed on the enforcement side and retried there
        if matches!(action, Action::FileEnforcement) {
            self.enforcement.initiate_filing(&case).await?;
        }

        // 5. Persist under the version check
        self.repo.update_case(&case, expected_version).await?;

        // 6. Exactly one event for the transition
        self.repo
            .append_event(CaseEvent::new(case.id, event_kind, event_payload))
            .await?;

        tracing::info!(
            case_id = %case.id,
            from = ?from,
            to = ?target,
            days_overdue,
            total_due = %case.total_due(),
            "case advanced"
        );

        Ok(Evaluation::Transition(TransitionRecord {
            case_id: case.id,
            invoice_id: case.invoice_id,
            from,
            to: target,
            days_overdue,
            total_due: case.total_due(),
        }))
    }

    /// Picks the single step for this run
    ///
    /// The auto-filing threshold is evaluated once, at the FormalNotice
    /// branch. A case parked in Collection whose accruals later cross the
    /// threshold stays in Collection; see DESIGN.md.
    fn decide(
        &self,
        case: &CollectionCase,
        config: &WorkflowConfig,
        days_overdue: i64,
        interest: Money,
    ) -> Action {
        match case.status {
            CaseStatus::Current => Action::MarkOverdue,
            CaseStatus::Overdue if days_overdue >= config.reminder_1_delay_days => {
                Action::Reminder(1)
            }
            CaseStatus::Reminder1 if days_overdue >= config.reminder_2_delay_days => {
                Action::Reminder(2)
            }
            CaseStatus::Reminder2 if days_overdue >= config.formal_notice_delay_days => {
                Action::FormalNotice
            }
            CaseStatus::FormalNotice if days_overdue >= config.filing_delay_days => {
                let total_due =
                    case.principal() + interest + case.accrued_fees();
                if total_due.amount() >= config.auto_filing_threshold
                    && total_due.amount() >= config.minimum_collection_amount
                {
                    Action::FileEnforcement
                } else {
                    Action::ManualCollection
                }
            }
            CaseStatus::Collection | CaseStatus::EnforcementFiled => Action::Refresh,
            _ => Action::None,
        }
    }

    /// Periodic interest refresh and deadline check for long-horizon states
    ///
    /// Not a state transition; no event is emitted.
    async fn refresh_long_horizon(
        &self,
        mut case: CollectionCase,
        interest: Money,
        today: NaiveDate,
        expected_version: u64,
    ) -> Result<Evaluation, CollectionError> {
        if case.status == CaseStatus::EnforcementFiled {
            // Pending submissions retry on the scheduler's rhythm
            self.enforcement.retry_pending(case.id).await?;
        }

        case.accrue_interest(interest)?;
        case.next_action_at = Some(today + Duration::days(7));
        self.repo.update_case(&case, expected_version).await?;
        Ok(Evaluation::Refreshed)
    }
}

enum Evaluation {
    Transition(TransitionRecord),
    Refreshed,
    NoAction,
}

/// Scheduler date after a transition: the offset of the next step measured
/// from the due date, or a 7-day horizon once automation hands off
fn next_action_date(
    status: CaseStatus,
    due_date: NaiveDate,
    today: NaiveDate,
    config: &WorkflowConfig,
) -> NaiveDate {
    match status {
        CaseStatus::Overdue => due_date + Duration::days(config.reminder_1_delay_days),
        CaseStatus::Reminder1 => due_date + Duration::days(config.reminder_2_delay_days),
        CaseStatus::Reminder2 => due_date + Duration::days(config.formal_notice_delay_days),
        CaseStatus::FormalNotice => due_date + Duration::days(config.filing_delay_days),
        _ => today + Duration::days(7),
    }
}

/// Variables handed to the correspondence template
fn correspondence_variables(
    case: &CollectionCase,
    config: &WorkflowConfig,
    days_overdue: i64,
    interest: Money,
    fee: Money,
) -> serde_json::Value {
    json!({
        "invoice_id": case.invoice_id,
        "owner_entity": case.owner_entity,
        "principal": case.principal().amount(),
        "interest": interest.amount(),
        "accrued_fees": case.accrued_fees().amount(),
        "step_fee": fee.amount(),
        "days_overdue": days_overdue,
        "interest_rate_percent": config.effective_rate().as_percentage(),
        "due_date": case.due_date,
    })
}
