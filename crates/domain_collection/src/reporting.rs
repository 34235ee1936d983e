//! Receivables reporting
//!
//! Read-only aggregations over the case store: the aging breakdown, the
//! largest outstanding debtors and the dashboard summary. Nothing here
//! mutates a case.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

use core_kernel::{Currency, DebtorId, Money, OwnerEntity};

use crate::case::CaseStatus;
use crate::error::CollectionError;
use crate::ports::CaseRepository;

/// Standard receivables aging buckets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgingBucket {
    /// Not yet due
    Current,
    Days1To30,
    Days31To60,
    Days61To90,
    Over90,
}

impl AgingBucket {
    /// Maps days overdue to a bucket
    pub fn for_days_overdue(days: i64) -> Self {
        match days {
            d if d <= 0 => AgingBucket::Current,
            1..=30 => AgingBucket::Days1To30,
            31..=60 => AgingBucket::Days31To60,
            61..=90 => AgingBucket::Days61To90,
            _ => AgingBucket::Over90,
        }
    }
}

/// One line of the aging report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgingLine {
    pub bucket: AgingBucket,
    pub case_count: usize,
    pub outstanding: Money,
}

/// Outstanding receivables grouped by age
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgingReport {
    pub as_of: NaiveDate,
    pub lines: Vec<AgingLine>,
    pub total_outstanding: Money,
}

/// One debtor's aggregate exposure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebtorExposure {
    pub debtor_id: DebtorId,
    pub case_count: usize,
    pub outstanding: Money,
    /// Age of the oldest open case, in days overdue
    pub oldest_days_overdue: i64,
}

/// Headline figures for the collection dashboard
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardSummary {
    pub as_of: NaiveDate,
    pub open_cases: usize,
    pub total_outstanding: Money,
    pub total_accrued_interest: Money,
    pub total_accrued_fees: Money,
    /// Mean days overdue across open overdue cases; zero when none are overdue
    pub average_days_overdue: Decimal,
    pub cases_by_status: HashMap<CaseStatus, usize>,
}

/// Read-only reporting over the case store
pub struct ReportingService {
    repo: Arc<dyn CaseRepository>,
    currency: Currency,
}

impl ReportingService {
    pub fn new(repo: Arc<dyn CaseRepository>, currency: Currency) -> Self {
        Self { repo, currency }
    }

    /// Aging breakdown of open cases as of a given date
    pub async fn aging_report(
        &self,
        owner: Option<&OwnerEntity>,
        as_of: NaiveDate,
    ) -> Result<AgingReport, CollectionError> {
        let cases = self.repo.open_cases(owner).await?;

        let mut buckets: HashMap<AgingBucket, (usize, Money)> = HashMap::new();
        let mut total = Money::zero(self.currency);
        for case in &cases {
            let outstanding = case.outstanding()?;
            let bucket = AgingBucket::for_days_overdue(case.days_overdue(as_of));
            let entry = buckets
                .entry(bucket)
                .or_insert((0, Money::zero(self.currency)));
            entry.0 += 1;
            entry.1 = entry.1.checked_add(&outstanding)?;
            total = total.checked_add(&outstanding)?;
        }

        let order = [
            AgingBucket::Current,
            AgingBucket::Days1To30,
            AgingBucket::Days31To60,
            AgingBucket::Days61To90,
            AgingBucket::Over90,
        ];
        let lines = order
            .into_iter()
            .map(|bucket| {
                let (case_count, outstanding) = buckets
                    .remove(&bucket)
                    .unwrap_or((0, Money::zero(self.currency)));
                AgingLine {
                    bucket,
                    case_count,
                    outstanding,
                }
            })
            .collect();

        Ok(AgingReport {
            as_of,
            lines,
            total_outstanding: total,
        })
    }

    /// The `limit` debtors with the largest aggregate outstanding amounts
    pub async fn top_debtors(
        &self,
        owner: Option<&OwnerEntity>,
        as_of: NaiveDate,
        limit: usize,
    ) -> Result<Vec<DebtorExposure>, CollectionError> {
        let cases = self.repo.open_cases(owner).await?;

        let mut by_debtor: HashMap<DebtorId, DebtorExposure> = HashMap::new();
        for case in &cases {
            let outstanding = case.outstanding()?;
            let days = case.days_overdue(as_of);
            let entry = by_debtor
                .entry(case.debtor_id)
                .or_insert_with(|| DebtorExposure {
                    debtor_id: case.debtor_id,
                    case_count: 0,
                    outstanding: Money::zero(self.currency),
                    oldest_days_overdue: 0,
                });
            entry.case_count += 1;
            entry.outstanding = entry.outstanding.checked_add(&outstanding)?;
            entry.oldest_days_overdue = entry.oldest_days_overdue.max(days);
        }

        let mut exposures: Vec<DebtorExposure> = by_debtor.into_values().collect();
        exposures.sort_by(|a, b| b.outstanding.amount().cmp(&a.outstanding.amount()));
        exposures.truncate(limit);
        Ok(exposures)
    }

    /// Headline dashboard figures as of a given date
    pub async fn summary(
        &self,
        owner: Option<&OwnerEntity>,
        as_of: NaiveDate,
    ) -> Result<DashboardSummary, CollectionError> {
        let cases = self.repo.open_cases(owner).await?;

        let mut total_outstanding = Money::zero(self.currency);
        let mut total_interest = Money::zero(self.currency);
        let mut total_fees = Money::zero(self.currency);
        let mut overdue_days_sum: i64 = 0;
        let mut overdue_count: usize = 0;
        let mut by_status: HashMap<CaseStatus, usize> = HashMap::new();

        for case in &cases {
            total_outstanding = total_outstanding.checked_add(&case.outstanding()?)?;
            total_interest = total_interest.checked_add(&case.accrued_interest())?;
            total_fees = total_fees.checked_add(&case.accrued_fees())?;
            *by_status.entry(case.status).or_insert(0) += 1;

            let days = case.days_overdue(as_of);
            if days > 0 {
                overdue_days_sum += days;
                overdue_count += 1;
            }
        }

        let average_days_overdue = if overdue_count > 0 {
            (Decimal::from(overdue_days_sum) / Decimal::from(overdue_count as u64)).round_dp(1)
        } else {
            Decimal::ZERO
        };

        Ok(DashboardSummary {
            as_of,
            open_cases: cases.len(),
            total_outstanding,
            total_accrued_interest: total_interest,
            total_accrued_fees: total_fees,
            average_days_overdue,
            cases_by_status: by_status,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bucket_boundaries() {
        assert_eq!(AgingBucket::for_days_overdue(-5), AgingBucket::Current);
        assert_eq!(AgingBucket::for_days_overdue(0), AgingBucket::Current);
        assert_eq!(AgingBucket::for_days_overdue(1), AgingBucket::Days1To30);
        assert_eq!(AgingBucket::for_days_overdue(30), AgingBucket::Days1To30);
        assert_eq!(AgingBucket::for_days_overdue(31), AgingBucket::Days31To60);
        assert_eq!(AgingBucket::for_days_overdue(60), AgingBucket::Days31To60);
        assert_eq!(AgingBucket::for_days_overdue(61), AgingBucket::Days61To90);
        assert_eq!(AgingBucket::for_days_overdue(90), AgingBucket::Days61To90);
        assert_eq!(AgingBucket::for_days_overdue(91), AgingBucket::Over90);
        assert_eq!(AgingBucket::for_days_overdue(400), AgingBucket::Over90);
    }
}
