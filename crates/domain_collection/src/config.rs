//! Per-owning-entity workflow configuration
//!
//! Day offsets, step fees, rates and thresholds are configuration data
//! keyed by owner entity, loaded once per processing run and immutable for
//! its duration. Tariff and workflow changes are data updates, never
//! redeployments.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use core_kernel::{Currency, Money, OwnerEntity, Rate};

/// Escalation workflow parameters for one owning entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowConfig {
    /// Days after due date for the first reminder
    pub reminder_1_delay_days: i64,
    /// Days after due date for the second reminder
    pub reminder_2_delay_days: i64,
    /// Days after due date for the formal notice
    pub formal_notice_delay_days: i64,
    /// Days after due date for the enforcement filing decision
    pub filing_delay_days: i64,

    /// Fee charged with the first reminder (customarily zero)
    pub reminder_1_fee: Decimal,
    /// Fee charged with the second reminder
    pub reminder_2_fee: Decimal,
    /// Fee charged with the formal notice
    pub formal_notice_fee: Decimal,

    /// Statutory annual interest rate in percent
    pub interest_rate_percent: Decimal,
    /// Contractual override, if the terms of sale define one
    pub contractual_rate_percent: Option<Decimal>,

    /// Below this outstanding amount no enforcement filing is pursued
    pub minimum_collection_amount: Decimal,
    /// At or above this total due, the filing is initiated automatically
    pub auto_filing_threshold: Decimal,

    /// Currency the entity invoices in
    pub currency: Currency,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            reminder_1_delay_days: 10,
            reminder_2_delay_days: 25,
            formal_notice_delay_days: 40,
            filing_delay_days: 55,
            reminder_1_fee: dec!(0),
            reminder_2_fee: dec!(20),
            formal_notice_fee: dec!(30),
            interest_rate_percent: dec!(5),
            contractual_rate_percent: None,
            minimum_collection_amount: dec!(100),
            auto_filing_threshold: dec!(1000),
            currency: Currency::CHF,
        }
    }
}

impl WorkflowConfig {
    /// The rate applied to this entity's cases: contractual if agreed,
    /// statutory otherwise
    pub fn effective_rate(&self) -> Rate {
        Rate::from_percentage(
            self.contractual_rate_percent
                .unwrap_or(self.interest_rate_percent),
        )
    }

    /// Fee for a reminder level, as money in the entity's currency
    pub fn reminder_fee(&self, level: u8) -> Money {
        let fee = match level {
            1 => self.reminder_1_fee,
            _ => self.reminder_2_fee,
        };
        Money::new(fee, self.currency)
    }

    /// Fee for the formal notice
    pub fn notice_fee(&self) -> Money {
        Money::new(self.formal_notice_fee, self.currency)
    }
}

/// Versioned registry of workflow configurations
///
/// Entities without an explicit entry fall back to the default
/// configuration. The registry is loaded once per run; a version bump
/// signals that tariff or offset data changed underneath.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkflowConfigRegistry {
    pub version: u32,
    default: WorkflowConfig,
    overrides: HashMap<OwnerEntity, WorkflowConfig>,
}

impl WorkflowConfigRegistry {
    /// Creates a registry with the given default configuration
    pub fn new(version: u32, default: WorkflowConfig) -> Self {
        Self {
            version,
            default,
            overrides: HashMap::new(),
        }
    }

    /// Registers an entity-specific configuration
    pub fn with_override(mut self, entity: OwnerEntity, config: WorkflowConfig) -> Self {
        self.overrides.insert(entity, config);
        self
    }

    /// Resolves the configuration for an owning entity
    pub fn config_for(&self, entity: &OwnerEntity) -> &WorkflowConfig {
        self.overrides.get(entity).unwrap_or(&self.default)
    }

    /// The fallback configuration for entities without an override
    pub fn default_config(&self) -> &WorkflowConfig {
        &self.default
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_offsets_match_workflow() {
        let config = WorkflowConfig::default();
        assert_eq!(config.reminder_1_delay_days, 10);
        assert_eq!(config.reminder_2_delay_days, 25);
        assert_eq!(config.formal_notice_delay_days, 40);
        assert_eq!(config.filing_delay_days, 55);
        assert_eq!(config.auto_filing_threshold, dec!(1000));
    }

    #[test]
    fn test_effective_rate_prefers_contractual() {
        let mut config = WorkflowConfig::default();
        assert_eq!(config.effective_rate().as_percentage(), dec!(5));

        config.contractual_rate_percent = Some(dec!(8));
        assert_eq!(config.effective_rate().as_percentage(), dec!(8));
    }

    #[test]
    fn test_registry_falls_back_to_default() {
        let lexaia = OwnerEntity::new("LEXAIA").unwrap();
        let takeout = OwnerEntity::new("TAKEOUT").unwrap();

        let mut special = WorkflowConfig::default();
        special.reminder_1_delay_days = 5;

        let registry = WorkflowConfigRegistry::new(1, WorkflowConfig::default())
            .with_override(lexaia.clone(), special);

        assert_eq!(registry.config_for(&lexaia).reminder_1_delay_days, 5);
        assert_eq!(registry.config_for(&takeout).reminder_1_delay_days, 10);
    }
}
