//! Aggregate builders with sensible defaults

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use core_kernel::{Currency, DebtorId, InvoiceId, Money, OwnerEntity};
use domain_collection::{CollectionCase, NewCase};

/// Builds collection cases and case inputs for tests
///
/// Defaults: CHF 1'000.00 for HYPERVISUAL, due 2025-01-31.
pub struct CaseBuilder {
    invoice_id: InvoiceId,
    owner_entity: OwnerEntity,
    debtor_id: DebtorId,
    principal: Decimal,
    currency: Currency,
    due_date: NaiveDate,
}

impl Default for CaseBuilder {
    fn default() -> Self {
        Self {
            invoice_id: InvoiceId::new(),
            owner_entity: OwnerEntity::new("HYPERVISUAL").expect("valid entity"),
            debtor_id: DebtorId::new(),
            principal: dec!(1000.00),
            currency: Currency::CHF,
            due_date: NaiveDate::from_ymd_opt(2025, 1, 31).expect("valid date"),
        }
    }
}

impl CaseBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn owner(mut self, entity: &str) -> Self {
        self.owner_entity = OwnerEntity::new(entity).expect("valid entity");
        self
    }

    pub fn debtor(mut self, debtor_id: DebtorId) -> Self {
        self.debtor_id = debtor_id;
        self
    }

    pub fn principal(mut self, amount: Decimal) -> Self {
        self.principal = amount;
        self
    }

    pub fn due(mut self, due_date: NaiveDate) -> Self {
        self.due_date = due_date;
        self
    }

    /// The input the escalation engine accepts
    pub fn as_input(&self) -> NewCase {
        NewCase {
            invoice_id: self.invoice_id,
            owner_entity: self.owner_entity.clone(),
            debtor_id: self.debtor_id,
            principal: Money::new(self.principal, self.currency),
            due_date: self.due_date,
        }
    }

    /// A constructed aggregate, for tests that bypass the engine
    pub fn build(&self) -> CollectionCase {
        CollectionCase::new(
            self.invoice_id,
            self.owner_entity.clone(),
            self.debtor_id,
            Money::new(self.principal, self.currency),
            self.due_date,
        )
        .expect("builder produces a valid case")
    }
}
