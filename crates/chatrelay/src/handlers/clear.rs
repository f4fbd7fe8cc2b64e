use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use serde::Serialize;
use tracing::info;

use crate::server::AppState;

#[derive(Serialize)]
pub struct ClearResponse {
    ok: bool,
    message: String,
}

/// GET|POST /clear/{session_id}
pub async fn clear_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> (StatusCode, Json<ClearResponse>) {
    if state.sessions.clear(&session_id) {
        info!(session = %session_id, "Cleared session");
        return (
            StatusCode::OK,
            Json(ClearResponse {
                ok: true,
                message: format!("cleared session {session_id}"),
            }),
        );
    }

    (
        StatusCode::NOT_FOUND,
        Json(ClearResponse {
            ok: false,
            message: "session not found".to_string(),
        }),
    )
}
