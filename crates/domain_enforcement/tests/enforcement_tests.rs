//! Filing and callback scenarios over in-memory stores
//!
//! A scripted gateway double drives the submission paths; callbacks are
//! applied end to end, down to payments settling the parent collection
//! case.

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use rust_decimal_macros::dec;
use serde_json::json;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex};

use core_kernel::{
    CaseId, Currency, DebtorId, DomainPort, EnforcementCaseId, InvoiceId, Money, OwnerEntity,
    PortError, RetryPolicy,
};
use domain_collection::{
    CaseEvent, CaseRepository, CaseStatus, CollectionCase, EventKind, InvoiceGateway,
    LedgerPoster, Payment, PaymentLedger, WorkflowConfig, WorkflowConfigRegistry,
};
use domain_enforcement::{
    AuthorityCallback, CallbackKind, CallbackOutcome, CallbackProcessor, DebtorDirectory,
    EnforcementCase, EnforcementError, EnforcementRepository, EnforcementService,
    EnforcementStatus, FilingPayload, FilingSubmitter, OfficeRegistry, SubmissionAck,
};

// ============================================================
// Test doubles
// ============================================================

#[derive(Default)]
struct MemoryCaseRepo {
    cases: Mutex<HashMap<CaseId, CollectionCase>>,
    events: Mutex<Vec<CaseEvent>>,
    payments: Mutex<Vec<Payment>>,
}

impl DomainPort for MemoryCaseRepo {}

#[async_trait]
impl CaseRepository for MemoryCaseRepo {
    async fn insert_case(&self, case: CollectionCase) -> Result<(), PortError> {
        self.cases.lock().unwrap().insert(case.id, case);
        Ok(())
    }

    async fn case(&self, id: CaseId) -> Result<CollectionCase, PortError> {
        self.cases
            .lock()
            .unwrap()
            .get(&id)
            .cloned()
            .ok_or_else(|| PortError::not_found("CollectionCase", id))
    }

    async fn case_by_invoice(
        &self,
        invoice_id: InvoiceId,
    ) -> Result<Option<CollectionCase>, PortError> {
        Ok(self
            .cases
            .lock()
            .unwrap()
            .values()
            .find(|c| c.invoice_id == invoice_id)
            .cloned())
    }

    async fn update_case(
        &self,
        case: &CollectionCase,
        expected_version: u64,
    ) -> Result<(), PortError> {
        let mut cases = self.cases.lock().unwrap();
        let stored = cases
            .get_mut(&case.id)
            .ok_or_else(|| PortError::not_found("CollectionCase", case.id))?;
        if stored.version != expected_version {
            return Err(PortError::version_conflict(format!("case {}", case.id)));
        }
        let mut updated = case.clone();
        updated.version = expected_version + 1;
        *stored = updated;
        Ok(())
    }

    async fn cases_due(
        &self,
        _owner: Option<&OwnerEntity>,
        _today: NaiveDate,
    ) -> Result<Vec<CollectionCase>, PortError> {
        Ok(Vec::new())
    }

    async fn cases_by_status(
        &self,
        _owner: &OwnerEntity,
        _status: Option<CaseStatus>,
    ) -> Result<Vec<CollectionCase>, PortError> {
        Ok(Vec::new())
    }

    async fn open_cases(
        &self,
        _owner: Option<&OwnerEntity>,
    ) -> Result<Vec<CollectionCase>, PortError> {
        Ok(self.cases.lock().unwrap().values().cloned().collect())
    }

    async fn append_event(&self, event: CaseEvent) -> Result<(), PortError> {
        self.events.lock().unwrap().push(event);
        Ok(())
    }

    async fn events_for(&self, case_id: CaseId) -> Result<Vec<CaseEvent>, PortError> {
        Ok(self
            .events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.case_id == case_id)
            .cloned()
            .collect())
    }

    async fn append_payment(&self, payment: Payment) -> Result<(), PortError> {
        self.payments.lock().unwrap().push(payment);
        Ok(())
    }

    async fn payments_for(&self, case_id: CaseId) -> Result<Vec<Payment>, PortError> {
        Ok(self
            .payments
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.case_id == case_id)
            .cloned()
            .collect())
    }
}

#[derive(Default)]
struct MemoryEnforcementRepo {
    filings: Mutex<HashMap<EnforcementCaseId, EnforcementCase>>,
    seen_keys: Mutex<HashSet<String>>,
    unmatched: Mutex<Vec<(String, serde_json::Value)>>,
}

impl DomainPort for MemoryEnforcementRepo {}

#[async_trait]
impl EnforcementRepository for MemoryEnforcementRepo {
    async fn insert(&self, filing: EnforcementCase) -> Result<(), PortError> {
        self.filings.lock().unwrap().insert(filing.id, filing);
        Ok(())
    }

    async fn get(&self, id: EnforcementCaseId) -> Result<EnforcementCase, PortError> {
        self.filings
            .lock()
            .unwrap()
            .get(&id)
            .cloned()
            .ok_or_else(|| PortError::not_found("EnforcementCase", id))
    }

    async fn by_case(&self, case_id: CaseId) -> Result<Option<EnforcementCase>, PortError> {
        Ok(self
            .filings
            .lock()
            .unwrap()
            .values()
            .find(|f| f.case_id == case_id)
            .cloned())
    }

    async fn find_by_reference(
        &self,
        reference: &str,
    ) -> Result<Option<EnforcementCase>, PortError> {
        Ok(self
            .filings
            .lock()
            .unwrap()
            .values()
            .find(|f| f.external_reference.as_deref() == Some(reference))
            .cloned())
    }

    async fn update(
        &self,
        filing: &EnforcementCase,
        expected_version: u64,
    ) -> Result<(), PortError> {
        let mut filings = self.filings.lock().unwrap();
        let stored = filings
            .get_mut(&filing.id)
            .ok_or_else(|| PortError::not_found("EnforcementCase", filing.id))?;
        if stored.version != expected_version {
            return Err(PortError::version_conflict(format!("filing {}", filing.id)));
        }
        let mut updated = filing.clone();
        updated.version = expected_version + 1;
        *stored = updated;
        Ok(())
    }

    async fn callback_seen(&self, key: &str) -> Result<bool, PortError> {
        Ok(self.seen_keys.lock().unwrap().contains(key))
    }

    async fn record_callback_key(&self, key: &str) -> Result<bool, PortError> {
        Ok(self.seen_keys.lock().unwrap().insert(key.to_string()))
    }

    async fn record_unmatched_callback(
        &self,
        reference: &str,
        payload: serde_json::Value,
    ) -> Result<(), PortError> {
        self.unmatched
            .lock()
            .unwrap()
            .push((reference.to_string(), payload));
        Ok(())
    }
}

struct StaticDirectory {
    canton: Option<String>,
}

impl DomainPort for StaticDirectory {}

#[async_trait]
impl DebtorDirectory for StaticDirectory {
    async fn canton_for(&self, _debtor_id: DebtorId) -> Result<Option<String>, PortError> {
        Ok(self.canton.clone())
    }
}

/// Pops one scripted response per submission; empty script means success
struct ScriptedSubmitter {
    script: Mutex<VecDeque<Result<SubmissionAck, PortError>>>,
    submitted: Mutex<Vec<FilingPayload>>,
}

impl ScriptedSubmitter {
    fn new() -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            submitted: Mutex::new(Vec::new()),
        }
    }

    fn push(&self, result: Result<SubmissionAck, PortError>) {
        self.script.lock().unwrap().push_back(result);
    }
}

impl DomainPort for ScriptedSubmitter {}

#[async_trait]
impl FilingSubmitter for ScriptedSubmitter {
    async fn submit(&self, payload: &FilingPayload) -> Result<SubmissionAck, PortError> {
        self.submitted.lock().unwrap().push(payload.clone());
        self.script.lock().unwrap().pop_front().unwrap_or_else(|| {
            Ok(SubmissionAck {
                external_reference: "LP-2025-000001".to_string(),
            })
        })
    }
}

struct NoopLedger;
impl DomainPort for NoopLedger {}

#[async_trait]
impl LedgerPoster for NoopLedger {
    async fn post_entry(
        &self,
        _debit_account: &str,
        _credit_account: &str,
        _amount: Money,
        _reference: &str,
    ) -> Result<(), PortError> {
        Ok(())
    }
}

struct NoopInvoices;
impl DomainPort for NoopInvoices {}

#[async_trait]
impl InvoiceGateway for NoopInvoices {
    async fn mark_settled(&self, _invoice_id: InvoiceId) -> Result<(), PortError> {
        Ok(())
    }
}

// ============================================================
// Fixture
// ============================================================

struct Fixture {
    repo: Arc<MemoryEnforcementRepo>,
    cases: Arc<MemoryCaseRepo>,
    submitter: Arc<ScriptedSubmitter>,
    service: EnforcementService,
    callbacks: CallbackProcessor,
}

fn fixture_with_canton(canton: Option<&str>) -> Fixture {
    let repo = Arc::new(MemoryEnforcementRepo::default());
    let cases = Arc::new(MemoryCaseRepo::default());
    let submitter = Arc::new(ScriptedSubmitter::new());
    let directory = Arc::new(StaticDirectory {
        canton: canton.map(|c| c.to_string()),
    });

    let service = EnforcementService::new(
        repo.clone(),
        cases.clone(),
        directory,
        submitter.clone(),
        OfficeRegistry::builtin().clone(),
        RetryPolicy::new(2),
    );

    let payments = Arc::new(PaymentLedger::new(
        cases.clone(),
        Arc::new(NoopLedger),
        Arc::new(NoopInvoices),
        WorkflowConfigRegistry::new(1, WorkflowConfig::default()),
    ));
    let callbacks = CallbackProcessor::new(repo.clone(), cases.clone(), payments);

    Fixture {
        repo,
        cases,
        submitter,
        service,
        callbacks,
    }
}

fn fixture() -> Fixture {
    fixture_with_canton(Some("ZH"))
}

async fn parent_case(fx: &Fixture) -> CollectionCase {
    let case = CollectionCase::new(
        InvoiceId::new(),
        OwnerEntity::new("HYPERVISUAL").unwrap(),
        DebtorId::new(),
        Money::new(dec!(16155.00), Currency::CHF),
        NaiveDate::from_ymd_opt(2025, 1, 31).unwrap(),
    )
    .unwrap();
    fx.cases.insert_case(case.clone()).await.unwrap();
    case
}

/// Files and walks the filing to `FilingNotified` on the given date
async fn notified_filing(fx: &Fixture, served: NaiveDate) -> EnforcementCase {
    let case = parent_case(fx).await;
    let filing = fx.service.file(&case).await.unwrap();
    let reference = filing.external_reference.clone().unwrap();

    for (kind, hour) in [
        (CallbackKind::Accepted, 8),
        (CallbackKind::FilingIssued, 9),
        (CallbackKind::FilingNotified, 10),
    ] {
        fx.callbacks
            .process(AuthorityCallback {
                external_reference: reference.clone(),
                event_type: kind,
                timestamp: served.and_hms_opt(hour, 0, 0).unwrap().and_utc(),
                payload: json!({ "notified_at": served }),
            })
            .await
            .unwrap();
    }

    fx.repo.get(filing.id).await.unwrap()
}

fn at(date: NaiveDate, hour: u32) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_hms_opt(hour, 0, 0).unwrap())
}

// ============================================================
// Filing and submission
// ============================================================

#[tokio::test]
async fn test_filing_routes_by_canton_and_applies_tariff() {
    let fx = fixture();
    let case = parent_case(&fx).await;

    let filing = fx.service.file(&case).await.unwrap();

    assert_eq!(filing.status, EnforcementStatus::Submitted);
    assert_eq!(filing.office_code, "ZH01");
    assert_eq!(filing.claim_amount.amount(), dec!(16155.00));
    // 10'000 < claim <= 100'000
    assert_eq!(filing.statutory_fee.amount(), dec!(128));
    assert_eq!(filing.external_reference.as_deref(), Some("LP-2025-000001"));

    let payloads = fx.submitter.submitted.lock().unwrap();
    assert_eq!(payloads.len(), 1);
    assert_eq!(payloads[0].office_code, "ZH01");
    assert_eq!(payloads[0].creditor_reference, case.id.to_string());
}

#[tokio::test]
async fn test_filing_is_idempotent_per_case() {
    let fx = fixture();
    let case = parent_case(&fx).await;

    let first = fx.service.file(&case).await.unwrap();
    let second = fx.service.file(&case).await.unwrap();
    assert_eq!(first.id, second.id);
    assert_eq!(fx.submitter.submitted.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_unknown_canton_routes_to_default_office() {
    let fx = fixture_with_canton(None);
    let case = parent_case(&fx).await;

    let filing = fx.service.file(&case).await.unwrap();
    assert_eq!(filing.office_code, "GE01");
}

#[tokio::test]
async fn test_transient_failure_keeps_filing_pending_and_retries() {
    let fx = fixture();
    let case = parent_case(&fx).await;
    fx.submitter.push(Err(PortError::ServiceUnavailable {
        service: "e-filing".to_string(),
    }));

    let filing = fx.service.file(&case).await.unwrap();
    assert_eq!(filing.status, EnforcementStatus::PendingSubmission);
    assert_eq!(filing.submission_attempts, 1);
    assert!(filing.last_submission_error.is_some());

    let events = fx.cases.events_for(case.id).await.unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].kind, EventKind::FilingSubmissionFailed);
    assert_eq!(events[0].payload["manual_required"], false);

    // Scripted queue is now empty, so the retry succeeds
    fx.service.retry_case(case.id).await.unwrap();
    let stored = fx.repo.by_case(case.id).await.unwrap().unwrap();
    assert_eq!(stored.status, EnforcementStatus::Submitted);
    assert_eq!(stored.submission_attempts, 2);
    assert!(stored.last_submission_error.is_none());
}

#[tokio::test]
async fn test_retry_budget_exhaustion_flags_manual_filing() {
    let fx = fixture();
    let case = parent_case(&fx).await;
    for _ in 0..3 {
        fx.submitter.push(Err(PortError::ServiceUnavailable {
            service: "e-filing".to_string(),
        }));
    }

    // max_retries = 2: initial attempt plus two retries, then paper
    fx.service.file(&case).await.unwrap();
    fx.service.retry_case(case.id).await.unwrap();
    fx.service.retry_case(case.id).await.unwrap();

    let stored = fx.repo.by_case(case.id).await.unwrap().unwrap();
    assert_eq!(stored.status, EnforcementStatus::ManualFilingRequired);
    assert_eq!(stored.submission_attempts, 3);

    let events = fx.cases.events_for(case.id).await.unwrap();
    assert_eq!(events.last().unwrap().payload["manual_required"], true);

    // No longer pending, so the scheduler stops retrying it
    fx.service.retry_case(case.id).await.unwrap();
    let stored = fx.repo.by_case(case.id).await.unwrap().unwrap();
    assert_eq!(stored.submission_attempts, 3);
}

#[tokio::test]
async fn test_rejection_flags_manual_filing_immediately() {
    let fx = fixture();
    let case = parent_case(&fx).await;
    fx.submitter.push(Err(PortError::Rejected {
        service: "e-filing".to_string(),
        message: "malformed debtor address".to_string(),
    }));

    let filing = fx.service.file(&case).await.unwrap();
    assert_eq!(filing.status, EnforcementStatus::ManualFilingRequired);
    assert_eq!(filing.submission_attempts, 1);
}

// ============================================================
// Callbacks
// ============================================================

#[tokio::test]
async fn test_notification_callback_starts_deadlines() {
    let fx = fixture();
    let served = NaiveDate::from_ymd_opt(2025, 4, 10).unwrap();
    let filing = notified_filing(&fx, served).await;

    assert_eq!(filing.status, EnforcementStatus::FilingNotified);
    assert_eq!(filing.notified_at, Some(served));
    assert_eq!(filing.opposition_deadline, Some(served + Duration::days(10)));
    assert_eq!(filing.payment_deadline, Some(served + Duration::days(20)));
    assert_eq!(
        filing.peremption_date,
        NaiveDate::from_ymd_opt(2026, 4, 10)
    );
}

#[tokio::test]
async fn test_duplicate_callback_is_acknowledged_not_reapplied() {
    let fx = fixture();
    let case = parent_case(&fx).await;
    let filing = fx.service.file(&case).await.unwrap();
    let reference = filing.external_reference.clone().unwrap();

    let callback = AuthorityCallback {
        external_reference: reference,
        event_type: CallbackKind::Accepted,
        timestamp: at(NaiveDate::from_ymd_opt(2025, 4, 1).unwrap(), 8),
        payload: json!({}),
    };

    let first = fx.callbacks.process(callback.clone()).await.unwrap();
    assert!(matches!(first, CallbackOutcome::Applied { .. }));

    let second = fx.callbacks.process(callback).await.unwrap();
    assert!(matches!(second, CallbackOutcome::Duplicate));

    // One callback event on the parent trail, not two
    let events = fx.cases.events_for(case.id).await.unwrap();
    let applied = events
        .iter()
        .filter(|e| e.kind == EventKind::CallbackApplied)
        .count();
    assert_eq!(applied, 1);
}

#[tokio::test]
async fn test_opposition_callback_raises_alert() {
    let fx = fixture();
    let served = NaiveDate::from_ymd_opt(2025, 4, 10).unwrap();
    let filing = notified_filing(&fx, served).await;

    fx.callbacks
        .process(AuthorityCallback {
            external_reference: filing.external_reference.clone().unwrap(),
            event_type: CallbackKind::OppositionFiled,
            timestamp: at(served + Duration::days(5), 9),
            payload: json!({}),
        })
        .await
        .unwrap();

    let stored = fx.repo.get(filing.id).await.unwrap();
    assert_eq!(stored.status, EnforcementStatus::OppositionFiled);

    let events = fx.cases.events_for(filing.case_id).await.unwrap();
    assert_eq!(events.last().unwrap().kind, EventKind::OppositionAlert);
}

#[tokio::test]
async fn test_payment_callback_settles_parent_case() {
    let fx = fixture();
    let served = NaiveDate::from_ymd_opt(2025, 4, 10).unwrap();
    let filing = notified_filing(&fx, served).await;

    // Covers principal, interest and the accrued fees comfortably
    fx.callbacks
        .process(AuthorityCallback {
            external_reference: filing.external_reference.clone().unwrap(),
            event_type: CallbackKind::PaymentReceived,
            timestamp: at(served + Duration::days(15), 14),
            payload: json!({ "amount": "17000.00" }),
        })
        .await
        .unwrap();

    let stored = fx.repo.get(filing.id).await.unwrap();
    assert_eq!(stored.status, EnforcementStatus::PaymentReceived);

    let parent = fx.cases.case(filing.case_id).await.unwrap();
    assert_eq!(parent.status, CaseStatus::Paid);

    let payments = fx.cases.payments_for(filing.case_id).await.unwrap();
    assert_eq!(payments.len(), 1);
    assert_eq!(payments[0].amount.amount(), dec!(17000.00));
}

#[tokio::test]
async fn test_unknown_reference_is_recorded_and_rejected() {
    let fx = fixture();

    let result = fx
        .callbacks
        .process(AuthorityCallback {
            external_reference: "LP-2025-999999".to_string(),
            event_type: CallbackKind::Accepted,
            timestamp: at(NaiveDate::from_ymd_opt(2025, 4, 1).unwrap(), 8),
            payload: json!({}),
        })
        .await;

    assert!(matches!(result, Err(EnforcementError::UnknownReference(_))));
    let unmatched = fx.repo.unmatched.lock().unwrap();
    assert_eq!(unmatched.len(), 1);
    assert_eq!(unmatched[0].0, "LP-2025-999999");
}

// ============================================================
// Continuation
// ============================================================

#[tokio::test]
async fn test_continuation_within_window() {
    let fx = fixture();
    let served = NaiveDate::from_ymd_opt(2025, 4, 10).unwrap();
    let filing = notified_filing(&fx, served).await;

    let updated = fx
        .service
        .request_continuation(filing.id, served + Duration::days(30))
        .await
        .unwrap();
    assert_eq!(updated.status, EnforcementStatus::ContinuationRequested);

    let events = fx.cases.events_for(filing.case_id).await.unwrap();
    assert_eq!(
        events.last().unwrap().kind,
        EventKind::ContinuationRequested
    );
}

#[tokio::test]
async fn test_continuation_after_peremption_is_refused() {
    let fx = fixture();
    let served = NaiveDate::from_ymd_opt(2025, 4, 10).unwrap();
    let filing = notified_filing(&fx, served).await;
    let deadline = filing.peremption_date.unwrap();

    let result = fx.service.request_continuation(filing.id, deadline).await;
    assert!(matches!(
        result,
        Err(EnforcementError::LegalDeadlineExpired { .. })
    ));

    // The day before the deadline is still within the window
    let updated = fx
        .service
        .request_continuation(filing.id, deadline - Duration::days(1))
        .await
        .unwrap();
    assert_eq!(updated.status, EnforcementStatus::ContinuationRequested);
}

#[tokio::test]
async fn test_continuation_blocked_by_opposition() {
    let fx = fixture();
    let served = NaiveDate::from_ymd_opt(2025, 4, 10).unwrap();
    let filing = notified_filing(&fx, served).await;

    fx.callbacks
        .process(AuthorityCallback {
            external_reference: filing.external_reference.clone().unwrap(),
            event_type: CallbackKind::OppositionFiled,
            timestamp: at(served + Duration::days(5), 9),
            payload: json!({}),
        })
        .await
        .unwrap();

    let result = fx
        .service
        .request_continuation(filing.id, served + Duration::days(30))
        .await;
    assert!(matches!(result, Err(EnforcementError::OppositionPending(_))));
}

#[tokio::test]
async fn test_continuation_before_notification_is_premature() {
    let fx = fixture();
    let case = parent_case(&fx).await;
    let filing = fx.service.file(&case).await.unwrap();

    let result = fx
        .service
        .request_continuation(filing.id, NaiveDate::from_ymd_opt(2025, 5, 1).unwrap())
        .await;
    assert!(matches!(result, Err(EnforcementError::Validation(_))));
}
