//! Core Kernel - Foundational types for the debt-collection system
//!
//! This crate provides the fundamental building blocks used across all domain modules:
//! - Money types with precise decimal arithmetic
//! - Strongly-typed identifiers and the owner-entity value object
//! - Port infrastructure shared by all adapters (errors, retry policy)

pub mod money;
pub mod identifiers;
pub mod ports;

pub use money::{Money, Currency, MoneyError, Rate};
pub use identifiers::{
    CaseId, InvoiceId, DebtorId, PaymentId, EventId, EnforcementCaseId,
    OwnerEntity,
};
pub use ports::{PortError, RetryPolicy, DomainPort};
