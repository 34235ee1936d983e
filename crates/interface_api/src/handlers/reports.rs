//! Reporting handlers

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::Utc;

use core_kernel::OwnerEntity;
use domain_collection::{AgingReport, DashboardSummary, DebtorExposure};

use crate::dto::cases::ReportQuery;
use crate::{error::ApiError, AppState};

const DEFAULT_TOP_DEBTORS: usize = 10;

fn resolve_scope(query: &ReportQuery) -> Result<(Option<OwnerEntity>, chrono::NaiveDate), ApiError> {
    let owner = query
        .owner_entity
        .as_deref()
        .map(OwnerEntity::new)
        .transpose()
        .map_err(|e| ApiError::Validation(e.to_string()))?;
    let as_of = query.as_of.unwrap_or_else(|| Utc::now().date_naive());
    Ok((owner, as_of))
}

/// Outstanding receivables grouped by age
pub async fn aging(
    State(state): State<AppState>,
    Query(query): Query<ReportQuery>,
) -> Result<Json<AgingReport>, ApiError> {
    let (owner, as_of) = resolve_scope(&query)?;
    let report = state.reporting.aging_report(owner.as_ref(), as_of).await?;
    Ok(Json(report))
}

/// Debtors with the largest aggregate outstanding amounts
pub async fn top_debtors(
    State(state): State<AppState>,
    Query(query): Query<ReportQuery>,
) -> Result<Json<Vec<DebtorExposure>>, ApiError> {
    let (owner, as_of) = resolve_scope(&query)?;
    let limit = query.limit.unwrap_or(DEFAULT_TOP_DEBTORS);
    let debtors = state
        .reporting
        .top_debtors(owner.as_ref(), as_of, limit)
        .await?;
    Ok(Json(debtors))
}

/// Headline dashboard figures
pub async fn summary(
    State(state): State<AppState>,
    Query(query): Query<ReportQuery>,
) -> Result<Json<DashboardSummary>, ApiError> {
    let (owner, as_of) = resolve_scope(&query)?;
    let summary = state.reporting.summary(owner.as_ref(), as_of).await?;
    Ok(Json(summary))
}
