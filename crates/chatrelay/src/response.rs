//! JSON error responses.
//!
//! Every error body carries a machine-readable `error` code plus a human
//! `message` or `details` field.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

/// 400 with only an error code, e.g. `{"error": "no message provided"}`.
pub fn bad_request(error: &str) -> Response {
    (StatusCode::BAD_REQUEST, Json(json!({ "error": error }))).into_response()
}

/// 400 for a body that is not valid JSON.
pub fn invalid_json(details: impl Into<String>) -> Response {
    with_details(StatusCode::BAD_REQUEST, "invalid json", details)
}

/// 400 for an unknown model, listing the accepted aliases.
pub fn invalid_model(message: impl Into<String>, allowed: Vec<String>) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "error": message.into(), "allowed": allowed })),
    )
        .into_response()
}

/// 401 for a missing or rejected upstream credential.
pub fn unauthorized(code: &str, message: impl Into<String>) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "error": code, "message": message.into() })),
    )
        .into_response()
}

/// 502 for a failed upstream call.
pub fn bad_gateway(code: &str, details: impl Into<String>) -> Response {
    with_details(StatusCode::BAD_GATEWAY, code, details)
}

/// 500 for anything unexpected.
pub fn server_error(details: impl Into<String>) -> Response {
    with_details(StatusCode::INTERNAL_SERVER_ERROR, "server error", details)
}

fn with_details(status: StatusCode, code: &str, details: impl Into<String>) -> Response {
    (status, Json(json!({ "error": code, "details": details.into() }))).into_response()
}
