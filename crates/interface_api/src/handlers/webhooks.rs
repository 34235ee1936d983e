//! Authority webhook handler
//!
//! Callbacks arrive signed with the shared secret agreed with the
//! authority gateway. An unsigned or mis-signed request is rejected before
//! the body is interpreted; duplicates are acknowledged with a 200 so the
//! sender stops retrying.

use axum::{extract::State, http::HeaderMap, Json};
use serde_json::{json, Value};

use domain_enforcement::{AuthorityCallback, CallbackOutcome};

use crate::middleware::signature_matches;
use crate::{error::ApiError, AppState};

/// Signature header the authority gateway sends
pub const SIGNATURE_HEADER: &str = "x-webhook-signature";

/// Receives an enforcement-authority callback
pub async fn enforcement_callback(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(callback): Json<AuthorityCallback>,
) -> Result<Json<Value>, ApiError> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or(ApiError::Unauthorized)?;
    if !signature_matches(signature, &state.config.webhook_secret) {
        tracing::warn!("webhook rejected: bad signature");
        return Err(ApiError::Unauthorized);
    }

    match state.callbacks.process(callback).await? {
        CallbackOutcome::Applied {
            enforcement_id,
            status,
        } => Ok(Json(json!({
            "result": "applied",
            "enforcement_id": enforcement_id,
            "status": status,
        }))),
        CallbackOutcome::Duplicate => Ok(Json(json!({ "result": "duplicate" }))),
    }
}
