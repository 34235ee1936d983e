//! Enforcement filing handlers

use axum::{
    extract::{Path, State},
    Json,
};
use chrono::Utc;
use uuid::Uuid;

use core_kernel::{CaseId, EnforcementCaseId};
use domain_enforcement::{EnforcementError, EnforcementRepository};

use crate::dto::enforcement::{ContinuationRequest, FilingResponse};
use crate::{error::ApiError, AppState};

/// Gets a filing by ID
pub async fn get_filing(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<FilingResponse>, ApiError> {
    let filing = state
        .store
        .get(EnforcementCaseId::from_uuid(id))
        .await
        .map_err(EnforcementError::from)?;
    Ok(Json(FilingResponse::from(&filing)))
}

/// The filing attached to a collection case, if any
pub async fn get_case_filing(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<FilingResponse>, ApiError> {
    let case_id = CaseId::from_uuid(id);
    let filing = state
        .store
        .by_case(case_id)
        .await
        .map_err(EnforcementError::from)?
        .ok_or_else(|| ApiError::NotFound(format!("no filing for case {case_id}")))?;
    Ok(Json(FilingResponse::from(&filing)))
}

/// Requests continuation of the procedure (art. 88 SchKG)
pub async fn request_continuation(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<ContinuationRequest>,
) -> Result<Json<FilingResponse>, ApiError> {
    let as_of = request.as_of.unwrap_or_else(|| Utc::now().date_naive());
    let filing = state
        .enforcement
        .request_continuation(EnforcementCaseId::from_uuid(id), as_of)
        .await?;
    Ok(Json(FilingResponse::from(&filing)))
}
