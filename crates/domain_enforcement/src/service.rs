//! Enforcement filing service
//!
//! Owns the hand-over from the collection workflow: opening the filing
//! record, driving electronic submission with retry, and the continuation
//! request with its peremption guard. External submission failures never
//! propagate to the caller; they are recorded on the filing and retried on
//! the scheduler's rhythm until the retry budget is spent, after which the
//! filing is flagged for paper handling.

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use serde_json::json;
use std::sync::Arc;

use core_kernel::{CaseId, DomainPort, EnforcementCaseId, PortError, RetryPolicy};
use domain_collection::{
    CaseEvent, CaseRepository, CollectionCase, EnforcementInitiator, EventKind, FeeSchedule,
};

use crate::case::{EnforcementCase, EnforcementStatus};
use crate::error::EnforcementError;
use crate::offices::OfficeRegistry;
use crate::ports::{DebtorDirectory, EnforcementRepository};
use crate::submission::{FilingPayload, FilingSubmitter};

/// Filing orchestration over the enforcement store and the gateway
pub struct EnforcementService {
    repo: Arc<dyn EnforcementRepository>,
    cases: Arc<dyn CaseRepository>,
    directory: Arc<dyn DebtorDirectory>,
    submitter: Arc<dyn FilingSubmitter>,
    offices: OfficeRegistry,
    tariff: FeeSchedule,
    retry: RetryPolicy,
}

impl EnforcementService {
    pub fn new(
        repo: Arc<dyn EnforcementRepository>,
        cases: Arc<dyn CaseRepository>,
        directory: Arc<dyn DebtorDirectory>,
        submitter: Arc<dyn FilingSubmitter>,
        offices: OfficeRegistry,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            repo,
            cases,
            directory,
            submitter,
            offices,
            tariff: FeeSchedule::federal_tariff().clone(),
            retry,
        }
    }

    /// Opens the filing and attempts electronic submission; idempotent on
    /// the parent case
    pub async fn file(&self, case: &CollectionCase) -> Result<EnforcementCase, EnforcementError> {
        if let Some(existing) = self.repo.by_case(case.id).await? {
            return Ok(existing);
        }

        let canton = self.directory.canton_for(case.debtor_id).await?;
        let office = self.offices.office_for_canton(canton.as_deref());
        if canton.is_none() {
            tracing::warn!(
                case_id = %case.id,
                office = %office.code,
                "debtor canton unknown, routing to default office"
            );
        }

        let claim = case.total_due();
        let fee = self.tariff.filing_fee(claim.amount());
        let mut filing = EnforcementCase::new(
            case.id,
            case.debtor_id,
            office.code.clone(),
            claim,
            fee,
        )?;
        self.repo.insert(filing.clone()).await?;

        tracing::info!(
            case_id = %case.id,
            enforcement_id = %filing.id,
            office = %filing.office_code,
            claim = %filing.claim_amount,
            fee = %filing.statutory_fee,
            "enforcement filing opened"
        );

        self.attempt_submission(&mut filing).await?;
        Ok(filing)
    }

    /// Re-attempts submission for a filing still awaiting acknowledgement
    pub async fn retry_case(&self, case_id: CaseId) -> Result<(), EnforcementError> {
        let Some(mut filing) = self.repo.by_case(case_id).await? else {
            return Ok(());
        };
        if filing.status == EnforcementStatus::PendingSubmission {
            self.attempt_submission(&mut filing).await?;
        }
        Ok(())
    }

    /// One submission attempt; gateway failures are absorbed into the filing
    async fn attempt_submission(
        &self,
        filing: &mut EnforcementCase,
    ) -> Result<(), EnforcementError> {
        let expected_version = filing.version;
        let payload = FilingPayload::from_case(filing, Utc::now().date_naive());

        match self.submitter.submit(&payload).await {
            Ok(ack) => {
                filing.record_submission(&ack.external_reference)?;
                self.repo.update(filing, expected_version).await?;
                tracing::info!(
                    enforcement_id = %filing.id,
                    reference = %ack.external_reference,
                    "filing acknowledged by authority"
                );
                Ok(())
            }
            Err(PortError::Rejected { service, message }) => {
                filing.record_submission_failure(&message);
                filing.transition_to(EnforcementStatus::ManualFilingRequired)?;
                self.repo.update(filing, expected_version).await?;
                self.append_failure_event(filing, &message, true).await?;
                tracing::error!(
                    enforcement_id = %filing.id,
                    service = %service,
                    error = %message,
                    "filing rejected, paper filing required"
                );
                Ok(())
            }
            Err(e) => {
                let message = e.to_string();
                filing.record_submission_failure(&message);
                let manual = filing.submission_attempts > self.retry.max_retries;
                if manual {
                    filing.transition_to(EnforcementStatus::ManualFilingRequired)?;
                }
                self.repo.update(filing, expected_version).await?;
                self.append_failure_event(filing, &message, manual).await?;
                tracing::warn!(
                    enforcement_id = %filing.id,
                    attempt = filing.submission_attempts,
                    error = %message,
                    "filing submission failed"
                );
                Ok(())
            }
        }
    }

    async fn append_failure_event(
        &self,
        filing: &EnforcementCase,
        error: &str,
        manual_required: bool,
    ) -> Result<(), EnforcementError> {
        self.cases
            .append_event(CaseEvent::new(
                filing.case_id,
                EventKind::FilingSubmissionFailed,
                json!({
                    "enforcement_id": filing.id,
                    "attempt": filing.submission_attempts,
                    "error": error,
                    "manual_required": manual_required,
                }),
            ))
            .await?;
        Ok(())
    }

    /// Requests continuation of the procedure (art. 88 SchKG)
    ///
    /// # Errors
    ///
    /// Returns `LegalDeadlineExpired` when the one-year window from
    /// notification has closed, and `OppositionPending` while the debtor's
    /// opposition stands.
    pub async fn request_continuation(
        &self,
        id: EnforcementCaseId,
        today: NaiveDate,
    ) -> Result<EnforcementCase, EnforcementError> {
        let mut filing = self.repo.get(id).await?;
        let expected_version = filing.version;

        let deadline = filing.peremption_date.ok_or_else(|| {
            EnforcementError::Validation(format!(
                "filing {id} has no notified payment order; continuation is premature"
            ))
        })?;
        if today >= deadline {
            return Err(EnforcementError::LegalDeadlineExpired { deadline });
        }
        if filing.status == EnforcementStatus::OppositionFiled {
            return Err(EnforcementError::OppositionPending(id.to_string()));
        }

        filing.transition_to(EnforcementStatus::ContinuationRequested)?;
        self.repo.update(&filing, expected_version).await?;
        self.cases
            .append_event(CaseEvent::new(
                filing.case_id,
                EventKind::ContinuationRequested,
                json!({ "enforcement_id": filing.id, "peremption_date": deadline }),
            ))
            .await?;

        tracing::info!(enforcement_id = %filing.id, "continuation requested");
        Ok(filing)
    }
}

fn to_port_error(err: EnforcementError) -> PortError {
    match err {
        EnforcementError::Validation(message) => PortError::validation(message),
        EnforcementError::ConcurrencyConflict(message) => PortError::version_conflict(message),
        EnforcementError::ExternalUnavailable { service } => PortError::ServiceUnavailable { service },
        EnforcementError::ExternalRejected { service, message } => {
            PortError::Rejected { service, message }
        }
        e => PortError::internal(e.to_string()),
    }
}

impl DomainPort for EnforcementService {}

/// The collection engine reaches the enforcement side through this port
#[async_trait]
impl EnforcementInitiator for EnforcementService {
    async fn initiate_filing(&self, case: &CollectionCase) -> Result<(), PortError> {
        self.file(case).await.map(|_| ()).map_err(to_port_error)
    }

    async fn retry_pending(&self, case_id: CaseId) -> Result<(), PortError> {
        self.retry_case(case_id).await.map_err(to_port_error)
    }
}
