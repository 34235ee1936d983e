//! In-memory store
//!
//! A single `InMemoryStore` backs both repository ports. Each table sits
//! behind its own `RwLock`; aggregate updates enforce the optimistic
//! version contract (persist at the expected version, bump by one), which
//! gives the per-case serialization the scheduler and the callback channel
//! rely on. Events, payments and callback keys are append-only.

use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::{HashMap, HashSet};
use tokio::sync::RwLock;

use core_kernel::{CaseId, DomainPort, EnforcementCaseId, InvoiceId, OwnerEntity, PortError};
use domain_collection::{
    CaseEvent, CaseRepository, CaseStatus, CollectionCase, Payment,
};
use domain_enforcement::{EnforcementCase, EnforcementRepository};

/// Shared in-memory state behind the repository ports
#[derive(Default)]
pub struct InMemoryStore {
    cases: RwLock<HashMap<CaseId, CollectionCase>>,
    events: RwLock<Vec<CaseEvent>>,
    payments: RwLock<Vec<Payment>>,
    filings: RwLock<HashMap<EnforcementCaseId, EnforcementCase>>,
    callback_keys: RwLock<HashSet<String>>,
    unmatched_callbacks: RwLock<Vec<(String, serde_json::Value)>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Callbacks that matched no filing, for operator review
    pub async fn unmatched_callbacks(&self) -> Vec<(String, serde_json::Value)> {
        self.unmatched_callbacks.read().await.clone()
    }
}

impl DomainPort for InMemoryStore {}

#[async_trait]
impl CaseRepository for InMemoryStore {
    async fn insert_case(&self, case: CollectionCase) -> Result<(), PortError> {
        let mut cases = self.cases.write().await;
        if cases.contains_key(&case.id) {
            return Err(PortError::validation(format!(
                "case {} already exists",
                case.id
            )));
        }
        cases.insert(case.id, case);
        Ok(())
    }

    async fn case(&self, id: CaseId) -> Result<CollectionCase, PortError> {
        self.cases
            .read()
            .await
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
            .read()
            .await
            .values()
            .find(|c| c.invoice_id == invoice_id)
            .cloned())
    }

    async fn update_case(
        &self,
        case: &CollectionCase,
        expected_version: u64,
    ) -> Result<(), PortError> {
        let mut cases = self.cases.write().await;
        let stored = cases
            .get_mut(&case.id)
            .ok_or_else(|| PortError::not_found("CollectionCase", case.id))?;
        if stored.version != expected_version {
            return Err(PortError::version_conflict(format!(
                "case {}: expected version {expected_version}, found {}",
                case.id, stored.version
            )));
        }
        let mut updated = case.clone();
        updated.version = expected_version + 1;
        *stored = updated;
        Ok(())
    }

    async fn cases_due(
        &self,
        owner: Option<&OwnerEntity>,
        today: NaiveDate,
    ) -> Result<Vec<CollectionCase>, PortError> {
        let mut due: Vec<CollectionCase> = self
            .cases
            .read()
            .await
            .values()
            .filter(|c| !c.is_terminal() && !c.is_suspended())
            .filter(|c| c.next_action_at.map(|d| d <= today).unwrap_or(false))
            .filter(|c| owner.map(|o| &c.owner_entity == o).unwrap_or(true))
            .cloned()
            .collect();
        // Deterministic evaluation order for the scheduler
        due.sort_by_key(|c| (c.due_date, c.id));
        Ok(due)
    }

    async fn cases_by_status(
        &self,
        owner: &OwnerEntity,
        status: Option<CaseStatus>,
    ) -> Result<Vec<CollectionCase>, PortError> {
        Ok(self
            .cases
            .read()
            .await
            .values()
            .filter(|c| &c.owner_entity == owner)
            .filter(|c| status.map(|s| c.status == s).unwrap_or(true))
            .cloned()
            .collect())
    }

    async fn open_cases(
        &self,
        owner: Option<&OwnerEntity>,
    ) -> Result<Vec<CollectionCase>, PortError> {
        Ok(self
            .cases
            .read()
            .await
            .values()
            .filter(|c| !c.is_terminal())
            .filter(|c| owner.map(|o| &c.owner_entity == o).unwrap_or(true))
            .cloned()
            .collect())
    }

    async fn append_event(&self, event: CaseEvent) -> Result<(), PortError> {
        self.events.write().await.push(event);
        Ok(())
    }

    async fn events_for(&self, case_id: CaseId) -> Result<Vec<CaseEvent>, PortError> {
        Ok(self
            .events
            .read()
            .await
            .iter()
            .filter(|e| e.case_id == case_id)
            .cloned()
            .collect())
    }

    async fn append_payment(&self, payment: Payment) -> Result<(), PortError> {
        self.payments.write().await.push(payment);
        Ok(())
    }

    async fn payments_for(&self, case_id: CaseId) -> Result<Vec<Payment>, PortError> {
        Ok(self
            .payments
            .read()
            .await
            .iter()
            .filter(|p| p.case_id == case_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl EnforcementRepository for InMemoryStore {
    async fn insert(&self, filing: EnforcementCase) -> Result<(), PortError> {
        let mut filings = self.filings.write().await;
        if filings.values().any(|f| f.case_id == filing.case_id) {
            return Err(PortError::validation(format!(
                "case {} already has a filing",
                filing.case_id
            )));
        }
        filings.insert(filing.id, filing);
        Ok(())
    }

    async fn get(&self, id: EnforcementCaseId) -> Result<EnforcementCase, PortError> {
        self.filings
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| PortError::not_found("EnforcementCase", id))
    }

    async fn by_case(&self, case_id: CaseId) -> Result<Option<EnforcementCase>, PortError> {
        Ok(self
            .filings
            .read()
            .await
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
            .read()
            .await
            .values()
            .find(|f| f.external_reference.as_deref() == Some(reference))
            .cloned())
    }

    async fn update(
        &self,
        filing: &EnforcementCase,
        expected_version: u64,
    ) -> Result<(), PortError> {
        let mut filings = self.filings.write().await;
        let stored = filings
            .get_mut(&filing.id)
            .ok_or_else(|| PortError::not_found("EnforcementCase", filing.id))?;
        if stored.version != expected_version {
            return Err(PortError::version_conflict(format!(
                "filing {}: expected version {expected_version}, found {}",
                filing.id, stored.version
            )));
        }
        let mut updated = filing.clone();
        updated.version = expected_version + 1;
        *stored = updated;
        Ok(())
    }

    async fn callback_seen(&self, key: &str) -> Result<bool, PortError> {
        Ok(self.callback_keys.read().await.contains(key))
    }

    async fn record_callback_key(&self, key: &str) -> Result<bool, PortError> {
        Ok(self.callback_keys.write().await.insert(key.to_string()))
    }

    async fn record_unmatched_callback(
        &self,
        reference: &str,
        payload: serde_json::Value,
    ) -> Result<(), PortError> {
        self.unmatched_callbacks
            .write()
            .await
            .push((reference.to_string(), payload));
        Ok(())
    }
}
