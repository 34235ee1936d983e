//! Moratory interest and statutory fee calculation
//!
//! Pure functions with no dependency on the case store. Interest follows
//! art. 104 CO: the statutory 5% annual rate unless a contractual rate was
//! agreed. Filing fees follow the federal tariff, modelled as a versioned
//! bracket table because the tariff is set externally and updated without
//! code changes.
//!
//! Interest amounts are rounded to plain 2 decimals. The accounting
//! subsystem rounds cash amounts to the nearest 5 centimes; the collection
//! subsystem deliberately keeps the 2-decimal convention of the reminder
//! letters and filing payloads (see DESIGN.md for the flagged mismatch).

use once_cell::sync::Lazy;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use core_kernel::{Currency, Money, Rate};
use crate::error::CollectionError;

/// Statutory moratory interest rate (art. 104 CO)
pub const STATUTORY_RATE_PERCENT: Decimal = dec!(5);

/// Contractual rates above this percentage are flagged for review
pub const SCRUTINY_RATE_PERCENT: Decimal = dec!(10);

/// Contractual rates above this percentage are rejected outright
/// (consumer-credit ceiling)
pub const USURY_RATE_PERCENT: Decimal = dec!(15);

/// Computes moratory interest for a number of overdue days
///
/// `interest = principal × rate × days / 365`, rounded to 2 decimals.
/// Zero days yields zero interest.
pub fn moratory_interest(principal: Money, rate: Rate, days: u32) -> Money {
    let factor = rate.as_decimal() * Decimal::from(days) / dec!(365);
    principal.multiply(factor).round_to_currency()
}

/// Advisory classification of a contractual interest rate
///
/// The classifier never clamps a rate; it reports the assessment so the
/// caller decides what to do with an aggressive contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateAssessment {
    /// At or below the scrutiny threshold
    Standard,
    /// Above the scrutiny threshold; high-risk, review advised
    Scrutiny,
    /// Above the usury ceiling; must be rejected
    Usurious,
}

/// Classifies a contractual rate against the scrutiny and usury thresholds
pub fn assess_rate(rate: Rate) -> RateAssessment {
    let pct = rate.as_percentage();
    if pct > USURY_RATE_PERCENT {
        RateAssessment::Usurious
    } else if pct > SCRUTINY_RATE_PERCENT {
        RateAssessment::Scrutiny
    } else {
        RateAssessment::Standard
    }
}

/// One bracket of the filing-fee tariff
///
/// `upper_bound` is inclusive; `None` marks the open top bracket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeBracket {
    pub upper_bound: Option<Decimal>,
    pub fee: Decimal,
}

/// Versioned statutory filing-fee tariff
///
/// A total-order lookup table over claim amounts: brackets are ordered by
/// ascending upper bound and end with exactly one open bracket, so every
/// amount ≥ 0 maps to exactly one fee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeSchedule {
    pub version: u32,
    pub currency: Currency,
    brackets: Vec<FeeBracket>,
}

impl FeeSchedule {
    /// Builds a schedule after validating the bracket table
    ///
    /// # Errors
    ///
    /// Returns `Validation` if the table is empty, the bounds are not
    /// strictly ascending, a closed bracket follows the open one, or the
    /// fees are not monotonically non-decreasing.
    pub fn new(
        version: u32,
        currency: Currency,
        brackets: Vec<FeeBracket>,
    ) -> Result<Self, CollectionError> {
        if brackets.is_empty() {
            return Err(CollectionError::Validation(
                "fee schedule must contain at least one bracket".to_string(),
            ));
        }
        if brackets.last().map(|b| b.upper_bound.is_some()) == Some(true) {
            return Err(CollectionError::Validation(
                "fee schedule must end with an open bracket".to_string(),
            ));
        }

        let last_index = brackets.len() - 1;
        let mut previous_bound: Option<Decimal> = None;
        let mut previous_fee: Option<Decimal> = None;
        for (index, bracket) in brackets.iter().enumerate() {
            if bracket.upper_bound.is_none() && index != last_index {
                return Err(CollectionError::Validation(
                    "open bracket must be last".to_string(),
                ));
            }
            if let (Some(prev), Some(bound)) = (previous_bound, bracket.upper_bound) {
                if bound <= prev {
                    return Err(CollectionError::Validation(format!(
                        "fee brackets must be strictly ascending: {bound} after {prev}"
                    )));
                }
            }
            if let Some(prev_fee) = previous_fee {
                if bracket.fee < prev_fee {
                    return Err(CollectionError::Validation(format!(
                        "fee brackets must be non-decreasing: {} after {prev_fee}",
                        bracket.fee
                    )));
                }
            }
            previous_bound = bracket.upper_bound.or(previous_bound);
            previous_fee = Some(bracket.fee);
        }

        Ok(Self {
            version,
            currency,
            brackets,
        })
    }

    /// Looks up the filing fee for a claim amount
    ///
    /// Upper bounds are inclusive: a claim of exactly 1000 falls in the
    /// 500–1000 bracket, not the 1000–10000 one.
    pub fn filing_fee(&self, claim_amount: Decimal) -> Money {
        let fee = self
            .brackets
            .iter()
            .find(|b| match b.upper_bound {
                Some(bound) => claim_amount <= bound,
                None => true,
            })
            .map(|b| b.fee)
            .unwrap_or_default();
        Money::new(fee, self.currency)
    }

    /// The current federal tariff for requisition filings
    pub fn federal_tariff() -> &'static FeeSchedule {
        &FEDERAL_TARIFF
    }
}

static FEDERAL_TARIFF: Lazy<FeeSchedule> = Lazy::new(|| {
    FeeSchedule::new(
        1,
        Currency::CHF,
        vec![
            FeeBracket { upper_bound: Some(dec!(100)), fee: dec!(10) },
            FeeBracket { upper_bound: Some(dec!(500)), fee: dec!(20) },
            FeeBracket { upper_bound: Some(dec!(1000)), fee: dec!(30) },
            FeeBracket { upper_bound: Some(dec!(10000)), fee: dec!(74) },
            FeeBracket { upper_bound: Some(dec!(100000)), fee: dec!(128) },
            FeeBracket { upper_bound: Some(dec!(1000000)), fee: dec!(190) },
            FeeBracket { upper_bound: None, fee: dec!(275) },
        ],
    )
    .expect("federal tariff table is well-formed")
});

#[cfg(test)]
mod tests {
    use super::*;

    fn chf(amount: Decimal) -> Money {
        Money::new(amount, Currency::CHF)
    }

    #[test]
    fn test_interest_reference_scenario() {
        // CHF 16'155.00 at 5% annual, 40 days overdue
        let interest = moratory_interest(
            chf(dec!(16155.00)),
            Rate::from_percentage(dec!(5)),
            40,
        );
        assert_eq!(interest.amount(), dec!(88.52));
    }

    #[test]
    fn test_zero_days_zero_interest() {
        let interest = moratory_interest(chf(dec!(16155.00)), Rate::from_percentage(dec!(5)), 0);
        assert!(interest.is_zero());
    }

    #[test]
    fn test_filing_fee_inclusive_upper_bound() {
        let tariff = FeeSchedule::federal_tariff();
        assert_eq!(tariff.filing_fee(dec!(950)).amount(), dec!(30));
        assert_eq!(tariff.filing_fee(dec!(1000)).amount(), dec!(30));
        assert_eq!(tariff.filing_fee(dec!(1000.01)).amount(), dec!(74));
    }

    #[test]
    fn test_filing_fee_extremes() {
        let tariff = FeeSchedule::federal_tariff();
        assert_eq!(tariff.filing_fee(dec!(0)).amount(), dec!(10));
        assert_eq!(tariff.filing_fee(dec!(5000000)).amount(), dec!(275));
    }

    #[test]
    fn test_schedule_rejects_unordered_brackets() {
        let result = FeeSchedule::new(
            1,
            Currency::CHF,
            vec![
                FeeBracket { upper_bound: Some(dec!(500)), fee: dec!(20) },
                FeeBracket { upper_bound: Some(dec!(100)), fee: dec!(30) },
                FeeBracket { upper_bound: None, fee: dec!(40) },
            ],
        );
        assert!(matches!(result, Err(CollectionError::Validation(_))));
    }

    #[test]
    fn test_schedule_requires_open_top_bracket() {
        let result = FeeSchedule::new(
            1,
            Currency::CHF,
            vec![FeeBracket { upper_bound: Some(dec!(100)), fee: dec!(10) }],
        );
        assert!(matches!(result, Err(CollectionError::Validation(_))));
    }

    #[test]
    fn test_rate_assessment_thresholds() {
        assert_eq!(assess_rate(Rate::from_percentage(dec!(5))), RateAssessment::Standard);
        assert_eq!(assess_rate(Rate::from_percentage(dec!(10))), RateAssessment::Standard);
        assert_eq!(assess_rate(Rate::from_percentage(dec!(12))), RateAssessment::Scrutiny);
        assert_eq!(assess_rate(Rate::from_percentage(dec!(15.01))), RateAssessment::Usurious);
    }
}
