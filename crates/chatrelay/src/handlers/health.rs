use axum::Json;
use axum::http::StatusCode;
use chrono::{SecondsFormat, Utc};
use serde::Serialize;

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    time: String,
}

/// GET /health
pub async fn health() -> (StatusCode, Json<HealthResponse>) {
    let response = HealthResponse {
        status: "ok",
        time: Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true),
    };
    (StatusCode::OK, Json(response))
}
