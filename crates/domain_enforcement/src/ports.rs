//! Enforcement domain ports

use async_trait::async_trait;
use serde_json::Value;

use core_kernel::{CaseId, DebtorId, DomainPort, EnforcementCaseId, PortError};

use crate::case::EnforcementCase;

/// Durable storage for enforcement filings
///
/// Same optimistic-versioning contract as the collection store: `update`
/// persists only at the expected version and bumps it by one.
#[async_trait]
pub trait EnforcementRepository: DomainPort {
    async fn insert(&self, filing: EnforcementCase) -> Result<(), PortError>;

    async fn get(&self, id: EnforcementCaseId) -> Result<EnforcementCase, PortError>;

    /// The filing for a parent collection case, if one exists
    async fn by_case(&self, case_id: CaseId) -> Result<Option<EnforcementCase>, PortError>;

    /// Resolves an authority callback reference to its filing
    async fn find_by_reference(
        &self,
        reference: &str,
    ) -> Result<Option<EnforcementCase>, PortError>;

    async fn update(
        &self,
        filing: &EnforcementCase,
        expected_version: u64,
    ) -> Result<(), PortError>;

    /// Whether a callback idempotency key was already applied
    async fn callback_seen(&self, key: &str) -> Result<bool, PortError>;

    /// Records a callback idempotency key after successful application;
    /// returns false when already seen
    async fn record_callback_key(&self, key: &str) -> Result<bool, PortError>;

    /// Keeps a trail of callbacks that matched no filing
    async fn record_unmatched_callback(
        &self,
        reference: &str,
        payload: Value,
    ) -> Result<(), PortError>;
}

/// Resolves the canton of a debtor's domicile for office routing
#[async_trait]
pub trait DebtorDirectory: DomainPort {
    /// Two-letter canton abbreviation, or None when the address is unknown
    async fn canton_for(&self, debtor_id: DebtorId) -> Result<Option<String>, PortError>;
}
