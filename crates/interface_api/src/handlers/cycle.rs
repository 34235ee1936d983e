//! Scheduled-run handler

use axum::{extract::State, Json};
use chrono::Utc;

use core_kernel::OwnerEntity;
use domain_collection::CycleSummary;

use crate::dto::cases::RunCycleRequest;
use crate::{error::ApiError, AppState};

/// Runs one escalation cycle
///
/// Normally invoked by the scheduler; exposed for operators to trigger a
/// run for one owning entity or to replay a day.
pub async fn run_cycle(
    State(state): State<AppState>,
    Json(request): Json<RunCycleRequest>,
) -> Result<Json<CycleSummary>, ApiError> {
    let owner = request
        .owner_entity
        .as_deref()
        .map(OwnerEntity::new)
        .transpose()
        .map_err(|e| ApiError::Validation(e.to_string()))?;
    let as_of = request.as_of.unwrap_or_else(|| Utc::now().date_naive());

    let summary = state.engine.run_cycle(owner.as_ref(), as_of).await?;
    Ok(Json(summary))
}
