//! Recording and scriptable doubles for the outbound ports

use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use core_kernel::{DebtorId, DomainPort, InvoiceId, Money, PortError};
use domain_collection::{CorrespondenceSender, InvoiceGateway, LedgerPoster, TemplateKind};
use domain_enforcement::{DebtorDirectory, FilingPayload, FilingSubmitter, SubmissionAck};

/// Records dispatched correspondence; can be switched to failure mode
#[derive(Default)]
pub struct RecordingCorrespondence {
    pub sent: Mutex<Vec<(DebtorId, TemplateKind, serde_json::Value)>>,
    pub fail: AtomicBool,
}

impl RecordingCorrespondence {
    pub fn sent_templates(&self) -> Vec<TemplateKind> {
        self.sent.lock().unwrap().iter().map(|(_, t, _)| *t).collect()
    }

    pub fn set_failing(&self, failing: bool) {
        self.fail.store(failing, Ordering::SeqCst);
    }
}

impl DomainPort for RecordingCorrespondence {}

#[async_trait]
impl CorrespondenceSender for RecordingCorrespondence {
    async fn send(
        &self,
        debtor_id: DebtorId,
        template: TemplateKind,
        variables: serde_json::Value,
    ) -> Result<(), PortError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(PortError::ServiceUnavailable {
                service: "notification".to_string(),
            });
        }
        self.sent.lock().unwrap().push((debtor_id, template, variables));
        Ok(())
    }
}

/// Records bookkeeping instructions
#[derive(Default)]
pub struct RecordingLedger {
    pub entries: Mutex<Vec<(String, String, Decimal, String)>>,
}

impl DomainPort for RecordingLedger {}

#[async_trait]
impl LedgerPoster for RecordingLedger {
    async fn post_entry(
        &self,
        debit_account: &str,
        credit_account: &str,
        amount: Money,
        reference: &str,
    ) -> Result<(), PortError> {
        self.entries.lock().unwrap().push((
            debit_account.to_string(),
            credit_account.to_string(),
            amount.amount(),
            reference.to_string(),
        ));
        Ok(())
    }
}

/// Records settled invoices
#[derive(Default)]
pub struct RecordingInvoices {
    pub settled: Mutex<Vec<InvoiceId>>,
}

impl DomainPort for RecordingInvoices {}

#[async_trait]
impl InvoiceGateway for RecordingInvoices {
    async fn mark_settled(&self, invoice_id: InvoiceId) -> Result<(), PortError> {
        self.settled.lock().unwrap().push(invoice_id);
        Ok(())
    }
}

/// Pops one scripted response per submission; an empty script acknowledges
/// with sequential references
pub struct ScriptedSubmitter {
    script: Mutex<VecDeque<Result<SubmissionAck, PortError>>>,
    pub submitted: Mutex<Vec<FilingPayload>>,
    counter: Mutex<u32>,
}

impl Default for ScriptedSubmitter {
    fn default() -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            submitted: Mutex::new(Vec::new()),
            counter: Mutex::new(0),
        }
    }
}

impl ScriptedSubmitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, result: Result<SubmissionAck, PortError>) {
        self.script.lock().unwrap().push_back(result);
    }

    pub fn last_reference(&self) -> Option<String> {
        let count = *self.counter.lock().unwrap();
        (count > 0).then(|| format!("LP-2025-{count:06}"))
    }
}

impl DomainPort for ScriptedSubmitter {}

#[async_trait]
impl FilingSubmitter for ScriptedSubmitter {
    async fn submit(&self, payload: &FilingPayload) -> Result<SubmissionAck, PortError> {
        self.submitted.lock().unwrap().push(payload.clone());
        if let Some(scripted) = self.script.lock().unwrap().pop_front() {
            return scripted;
        }
        let mut counter = self.counter.lock().unwrap();
        *counter += 1;
        Ok(SubmissionAck {
            external_reference: format!("LP-2025-{:06}", *counter),
        })
    }
}

/// Answers every canton lookup with the same value
pub struct StaticDirectory {
    canton: Option<String>,
}

impl StaticDirectory {
    pub fn new(canton: Option<&str>) -> Self {
        Self {
            canton: canton.map(|c| c.to_string()),
        }
    }
}

impl DomainPort for StaticDirectory {}

#[async_trait]
impl DebtorDirectory for StaticDirectory {
    async fn canton_for(&self, _debtor_id: DebtorId) -> Result<Option<String>, PortError> {
        Ok(self.canton.clone())
    }
}
