//! API middleware

use axum::{
    body::Body,
    http::Request,
    middleware::Next,
    response::Response,
};
use chrono::Utc;
use tracing::info;

/// Constant-time comparison for webhook signatures
///
/// Always walks the full provided value so timing does not leak the match
/// prefix length.
pub fn signature_matches(provided: &str, expected: &str) -> bool {
    let provided = provided.as_bytes();
    let expected = expected.as_bytes();
    if expected.is_empty() {
        return provided.is_empty();
    }
    let mut diff = provided.len() ^ expected.len();
    for (i, byte) in provided.iter().enumerate() {
        diff |= (byte ^ expected[i % expected.len()]) as usize;
    }
    diff == 0
}

/// Audit logging middleware
///
/// Logs every API request for the compliance trail.
pub async fn audit_middleware(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();

    let start = Utc::now();
    let response = next.run(request).await;
    let duration = Utc::now() - start;
    let status = response.status();

    info!(
        method = %method,
        uri = %uri,
        status = %status.as_u16(),
        duration_ms = duration.num_milliseconds(),
        "API request"
    );

    response
}
