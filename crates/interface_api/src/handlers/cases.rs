//! Collection case handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

use core_kernel::{CaseId, Money, OwnerEntity};
use domain_collection::{
    CaseEvent, CaseRepository, CollectionError, NewCase, Payment, PaymentOutcome,
};

use crate::dto::cases::*;
use crate::{error::ApiError, AppState};

fn parse_owner(value: &str) -> Result<OwnerEntity, ApiError> {
    OwnerEntity::new(value).map_err(|e| ApiError::Validation(e.to_string()))
}

/// Opens collection tracking for an invoice; idempotent on the invoice
pub async fn create_case(
    State(state): State<AppState>,
    Json(request): Json<CreateCaseRequest>,
) -> Result<(StatusCode, Json<CaseResponse>), ApiError> {
    request
        .validate()
        .map_err(|e| ApiError::Validation(e.to_string()))?;

    let case = state
        .engine
        .init_case(NewCase {
            invoice_id: request.invoice_id,
            owner_entity: parse_owner(&request.owner_entity)?,
            debtor_id: request.debtor_id,
            principal: Money::new(request.principal, request.currency),
            due_date: request.due_date,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(CaseResponse::from(&case))))
}

/// Lists an owning entity's cases, optionally filtered by status
pub async fn list_cases(
    State(state): State<AppState>,
    Query(query): Query<ListCasesQuery>,
) -> Result<Json<Vec<CaseResponse>>, ApiError> {
    let owner = parse_owner(&query.owner_entity)?;
    let cases = state
        .store
        .cases_by_status(&owner, query.status)
        .await
        .map_err(CollectionError::from)?;
    Ok(Json(cases.iter().map(CaseResponse::from).collect()))
}

/// Gets a case by ID
pub async fn get_case(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<CaseResponse>, ApiError> {
    let case = state
        .store
        .case(CaseId::from_uuid(id))
        .await
        .map_err(CollectionError::from)?;
    Ok(Json(CaseResponse::from(&case)))
}

/// The case's audit trail
pub async fn get_case_events(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<CaseEvent>>, ApiError> {
    let case_id = CaseId::from_uuid(id);
    // 404 on unknown case rather than an empty trail
    state
        .store
        .case(case_id)
        .await
        .map_err(CollectionError::from)?;
    let events = state
        .store
        .events_for(case_id)
        .await
        .map_err(CollectionError::from)?;
    Ok(Json(events))
}

/// Payments recorded against the case
pub async fn get_case_payments(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<Payment>>, ApiError> {
    let case_id = CaseId::from_uuid(id);
    state
        .store
        .case(case_id)
        .await
        .map_err(CollectionError::from)?;
    let payments = state
        .store
        .payments_for(case_id)
        .await
        .map_err(CollectionError::from)?;
    Ok(Json(payments))
}

/// Records a payment; settles the case when it covers the total due
pub async fn record_payment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<RecordPaymentRequest>,
) -> Result<Json<PaymentOutcome>, ApiError> {
    let case_id = CaseId::from_uuid(id);
    let case = state
        .store
        .case(case_id)
        .await
        .map_err(CollectionError::from)?;

    let outcome = state
        .payments
        .record_payment(
            case_id,
            Money::new(request.amount, case.principal().currency()),
            request.paid_at,
            request.method,
            request.reference,
        )
        .await?;
    Ok(Json(outcome))
}

/// Excludes the case from scheduled runs
pub async fn suspend_case(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<SuspendRequest>,
) -> Result<Json<CaseResponse>, ApiError> {
    request
        .validate()
        .map_err(|e| ApiError::Validation(e.to_string()))?;

    let case_id = CaseId::from_uuid(id);
    state.payments.suspend(case_id, request.reason).await?;
    let case = state
        .store
        .case(case_id)
        .await
        .map_err(CollectionError::from)?;
    Ok(Json(CaseResponse::from(&case)))
}

/// Restores a suspended case to its pre-suspension status
pub async fn resume_case(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<CaseResponse>, ApiError> {
    let case_id = CaseId::from_uuid(id);
    state
        .payments
        .resume(case_id, Utc::now().date_naive())
        .await?;
    let case = state
        .store
        .case(case_id)
        .await
        .map_err(CollectionError::from)?;
    Ok(Json(CaseResponse::from(&case)))
}

/// Irreversibly writes the receivable off as bad debt
pub async fn write_off_case(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<WriteOffRequest>,
) -> Result<Json<CaseResponse>, ApiError> {
    request
        .validate()
        .map_err(|e| ApiError::Validation(e.to_string()))?;

    let case_id = CaseId::from_uuid(id);
    state.payments.write_off(case_id, request.reason).await?;
    let case = state
        .store
        .case(case_id)
        .await
        .map_err(CollectionError::from)?;
    Ok(Json(CaseResponse::from(&case)))
}
