//! Response construction.
//!
//! # Responsibilities
//! - Build the stable JSON rejection body `{"error": message}`
//! - Merge the computed security header set into any response
//!
//! # Design Decisions
//! - Rejection bodies never carry stack traces, query fragments, or
//!   internal identifiers; the message is the whole story
//! - Security headers overwrite whatever the upstream set for the same
//!   names

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::security::headers::SecurityHeaderSet;

/// JSON error response with a stable `error` field.
pub fn json_error(status: StatusCode, message: &str) -> Response {
    (status, Json(serde_json::json!({ "error": message }))).into_response()
}

/// Merge the security header set into a response, replacing duplicates.
pub fn apply_security_headers(response: &mut Response, headers: &SecurityHeaderSet) {
    for (name, value) in headers {
        response.headers_mut().insert(name.clone(), value.clone());
    }
}
