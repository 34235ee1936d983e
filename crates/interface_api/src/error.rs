//! API error handling
//!
//! One mapping from the domain errors to HTTP. The two distinct 409s
//! matter to callers: `conflict` means retry later, `legal_deadline_expired`
//! means the statutory window is gone and no retry will ever succeed.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use domain_collection::CollectionError;
use domain_enforcement::EnforcementError;

/// API error types
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Conflict: {0}")]
    Conflict(String),

    /// A statutory deadline has closed; distinct from a retryable conflict
    #[error("Legal deadline expired: {0}")]
    DeadlineExpired(String),

    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("Upstream rejected: {0}")]
    UpstreamRejected(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<String>>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match &self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg.clone()),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg.clone()),
            ApiError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "unauthorized",
                "Unauthorized".to_string(),
            ),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg.clone()),
            ApiError::DeadlineExpired(msg) => (
                StatusCode::CONFLICT,
                "legal_deadline_expired",
                msg.clone(),
            ),
            ApiError::UpstreamUnavailable(msg) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "upstream_unavailable",
                msg.clone(),
            ),
            ApiError::UpstreamRejected(msg) => {
                (StatusCode::BAD_GATEWAY, "upstream_rejected", msg.clone())
            }
            ApiError::Validation(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "validation_error",
                msg.clone(),
            ),
            ApiError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                msg.clone(),
            ),
        };

        let body = ErrorResponse {
            error: error_type.to_string(),
            message,
            details: None,
        };

        (status, Json(body)).into_response()
    }
}

impl From<CollectionError> for ApiError {
    fn from(err: CollectionError) -> Self {
        match err {
            CollectionError::Validation(msg) => ApiError::Validation(msg),
            CollectionError::CaseNotFound(msg) => ApiError::NotFound(msg),
            CollectionError::InvalidStatusTransition { .. } => ApiError::Conflict(err.to_string()),
            CollectionError::ConcurrencyConflict(msg) => ApiError::Conflict(msg),
            CollectionError::CaseClosed(msg) => ApiError::Conflict(format!("case closed: {msg}")),
            CollectionError::ExternalUnavailable { service } => {
                ApiError::UpstreamUnavailable(service)
            }
            CollectionError::ExternalRejected { service, message } => {
                ApiError::UpstreamRejected(format!("{service}: {message}"))
            }
            CollectionError::Money(e) => ApiError::Validation(e.to_string()),
            e @ CollectionError::UnbalancedState(_) => ApiError::Internal(e.to_string()),
            e => ApiError::Internal(e.to_string()),
        }
    }
}

impl From<EnforcementError> for ApiError {
    fn from(err: EnforcementError) -> Self {
        match err {
            EnforcementError::Validation(msg) => ApiError::Validation(msg),
            EnforcementError::NotFound(msg) | EnforcementError::UnknownReference(msg) => {
                ApiError::NotFound(msg)
            }
            EnforcementError::InvalidStatusTransition { .. } => ApiError::Conflict(err.to_string()),
            EnforcementError::LegalDeadlineExpired { deadline } => {
                ApiError::DeadlineExpired(format!("peremption reached on {deadline}"))
            }
            EnforcementError::OppositionPending(msg) => {
                ApiError::Conflict(format!("opposition pending: {msg}"))
            }
            EnforcementError::ConcurrencyConflict(msg) => ApiError::Conflict(msg),
            EnforcementError::ExternalUnavailable { service } => {
                ApiError::UpstreamUnavailable(service)
            }
            EnforcementError::ExternalRejected { service, message } => {
                ApiError::UpstreamRejected(format!("{service}: {message}"))
            }
            EnforcementError::Collection(e) => ApiError::from(e),
            e => ApiError::Internal(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_deadline_and_conflict_are_distinct_codes() {
        let conflict = ApiError::from(CollectionError::ConcurrencyConflict("case".to_string()));
        assert!(matches!(conflict, ApiError::Conflict(_)));

        let expired = ApiError::from(EnforcementError::LegalDeadlineExpired {
            deadline: NaiveDate::from_ymd_opt(2026, 4, 10).unwrap(),
        });
        assert!(matches!(expired, ApiError::DeadlineExpired(_)));
    }
}
