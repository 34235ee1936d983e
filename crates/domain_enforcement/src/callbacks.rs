//! Authority callback processing
//!
//! The enforcement authority reports progress asynchronously and delivers
//! at least once. Each callback carries the authority's reference, an event
//! type and a timestamp; that triple is the idempotency key, so replays are
//! acknowledged without touching the case a second time. A callback whose
//! reference matches no filing is recorded for operator review and
//! rejected, never silently dropped.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

use core_kernel::{EnforcementCaseId, Money};
use domain_collection::{
    CaseEvent, CaseRepository, EventKind, PaymentLedger, PaymentMethod,
};

use crate::case::{EnforcementCase, EnforcementStatus};
use crate::error::EnforcementError;
use crate::ports::EnforcementRepository;

/// Progress event types the authority reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallbackKind {
    /// The requisition passed the authority's validation
    Accepted,
    /// The payment order was issued
    FilingIssued,
    /// The payment order was served on the debtor
    FilingNotified,
    /// The debtor filed opposition
    OppositionFiled,
    /// A payment arrived at the enforcement office
    PaymentReceived,
    /// The procedure concluded
    Completed,
}

impl CallbackKind {
    fn as_str(&self) -> &'static str {
        match self {
            CallbackKind::Accepted => "accepted",
            CallbackKind::FilingIssued => "filing_issued",
            CallbackKind::FilingNotified => "filing_notified",
            CallbackKind::OppositionFiled => "opposition_filed",
            CallbackKind::PaymentReceived => "payment_received",
            CallbackKind::Completed => "completed",
        }
    }
}

/// One callback as delivered by the authority
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorityCallback {
    /// The reference assigned at submission
    pub external_reference: String,
    pub event_type: CallbackKind,
    /// The authority's event timestamp, part of the idempotency key
    pub timestamp: DateTime<Utc>,
    /// Event-specific details (notification date, payment amount)
    #[serde(default)]
    pub payload: serde_json::Value,
}

impl AuthorityCallback {
    /// The replay-detection key: reference, event type and timestamp
    pub fn idempotency_key(&self) -> String {
        format!(
            "{}:{}:{}",
            self.external_reference,
            self.event_type.as_str(),
            self.timestamp.to_rfc3339()
        )
    }
}

/// Result of processing one callback
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum CallbackOutcome {
    /// The callback advanced the filing
    Applied {
        enforcement_id: EnforcementCaseId,
        status: EnforcementStatus,
    },
    /// A replay of an already applied callback; acknowledged, not reapplied
    Duplicate,
}

/// Applies authority callbacks to filings and their parent cases
pub struct CallbackProcessor {
    repo: Arc<dyn EnforcementRepository>,
    cases: Arc<dyn CaseRepository>,
    payments: Arc<PaymentLedger>,
}

impl CallbackProcessor {
    pub fn new(
        repo: Arc<dyn EnforcementRepository>,
        cases: Arc<dyn CaseRepository>,
        payments: Arc<PaymentLedger>,
    ) -> Self {
        Self {
            repo,
            cases,
            payments,
        }
    }

    /// Processes one callback
    ///
    /// # Errors
    ///
    /// Returns `UnknownReference` when the reference matches no filing; the
    /// callback is kept in the unmatched trail for operator review.
    pub async fn process(
        &self,
        callback: AuthorityCallback,
    ) -> Result<CallbackOutcome, EnforcementError> {
        let key = callback.idempotency_key();
        if self.repo.callback_seen(&key).await? {
            tracing::debug!(key = %key, "duplicate callback acknowledged");
            return Ok(CallbackOutcome::Duplicate);
        }

        let Some(mut filing) = self
            .repo
            .find_by_reference(&callback.external_reference)
            .await?
        else {
            tracing::warn!(
                reference = %callback.external_reference,
                event_type = ?callback.event_type,
                "callback matched no filing"
            );
            self.repo
                .record_unmatched_callback(
                    &callback.external_reference,
                    json!({
                        "event_type": callback.event_type,
                        "timestamp": callback.timestamp,
                        "payload": callback.payload,
                    }),
                )
                .await?;
            return Err(EnforcementError::UnknownReference(
                callback.external_reference,
            ));
        };
        let expected_version = filing.version;

        self.apply(&mut filing, &callback).await?;
        self.repo.update(&filing, expected_version).await?;

        let event_kind = match callback.event_type {
            CallbackKind::OppositionFiled => EventKind::OppositionAlert,
            _ => EventKind::CallbackApplied,
        };
        self.cases
            .append_event(CaseEvent::new(
                filing.case_id,
                event_kind,
                json!({
                    "enforcement_id": filing.id,
                    "reference": callback.external_reference,
                    "event_type": callback.event_type,
                    "status": filing.status,
                    "opposition_deadline": filing.opposition_deadline,
                    "payment_deadline": filing.payment_deadline,
                }),
            ))
            .await?;

        self.repo.record_callback_key(&key).await?;

        tracing::info!(
            enforcement_id = %filing.id,
            event_type = ?callback.event_type,
            status = ?filing.status,
            "authority callback applied"
        );
        Ok(CallbackOutcome::Applied {
            enforcement_id: filing.id,
            status: filing.status,
        })
    }

    async fn apply(
        &self,
        filing: &mut EnforcementCase,
        callback: &AuthorityCallback,
    ) -> Result<(), EnforcementError> {
        match callback.event_type {
            CallbackKind::Accepted => filing.transition_to(EnforcementStatus::Accepted),
            CallbackKind::FilingIssued => filing.transition_to(EnforcementStatus::FilingIssued),
            CallbackKind::FilingNotified => {
                let notified_at = self.notified_date(callback);
                filing.record_notification(notified_at)
            }
            CallbackKind::OppositionFiled => {
                filing.transition_to(EnforcementStatus::OppositionFiled)
            }
            CallbackKind::PaymentReceived => {
                let amount = callback
                    .payload
                    .get("amount")
                    .cloned()
                    .ok_or_else(|| {
                        EnforcementError::Validation(
                            "payment callback is missing the amount".to_string(),
                        )
                    })
                    .and_then(|v| {
                        serde_json::from_value::<Decimal>(v).map_err(|e| {
                            EnforcementError::Validation(format!("unreadable amount: {e}"))
                        })
                    })?;
                let money = Money::new(amount, filing.claim_amount.currency());
                self.payments
                    .record_payment(
                        filing.case_id,
                        money,
                        callback.timestamp,
                        PaymentMethod::EnforcementProceeds,
                        Some(callback.external_reference.clone()),
                    )
                    .await?;
                filing.transition_to(EnforcementStatus::PaymentReceived)
            }
            CallbackKind::Completed => filing.transition_to(EnforcementStatus::Completed),
        }
    }

    /// Notification date from the payload, falling back to the event date
    fn notified_date(&self, callback: &AuthorityCallback) -> NaiveDate {
        callback
            .payload
            .get("notified_at")
            .and_then(|v| serde_json::from_value::<NaiveDate>(v.clone()).ok())
            .unwrap_or_else(|| callback.timestamp.date_naive())
    }
}
