//! Speech-to-text endpoint.
//!
//! Always answers 200; failures are reported through `success: false`.

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use serde::Serialize;
use tracing::{info, warn};

use crate::server::AppState;

const NO_SPEECH: &str = "No speech detected. Please try again and speak clearly.";
const NOT_UNDERSTOOD: &str = "Could not understand audio. Please speak more slowly and clearly.";

#[derive(Serialize)]
pub struct ListenResponse {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl ListenResponse {
    fn text(text: String) -> Self {
        Self {
            success: true,
            text: Some(text),
            error: None,
        }
    }

    fn error(error: impl Into<String>) -> Self {
        Self {
            success: false,
            text: None,
            error: Some(error.into()),
        }
    }
}

/// POST /listen
///
/// The request body is the raw audio recording.
pub async fn listen(State(state): State<AppState>, audio: Bytes) -> Json<ListenResponse> {
    if audio.is_empty() {
        return Json(ListenResponse::error(NO_SPEECH));
    }

    let Some(transcriber) = state.transcriber.as_ref() else {
        return Json(ListenResponse::error(
            "Service error: transcription is not configured",
        ));
    };

    match transcriber.transcribe(audio.to_vec()).await {
        Ok(text) if text.trim().is_empty() => Json(ListenResponse::error(NOT_UNDERSTOOD)),
        Ok(text) => {
            info!(chars = text.len(), "Recognized speech");
            Json(ListenResponse::text(text.trim().to_string()))
        }
        Err(e) => {
            warn!(error = %e, "Transcription failed");
            Json(ListenResponse::error(format!("Service error: {e}")))
        }
    }
}
