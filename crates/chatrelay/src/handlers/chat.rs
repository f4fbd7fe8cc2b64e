//! Chat handler: validate, route, record the turn pair.

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::llm::{ModelError, Role};
use crate::response;
use crate::server::AppState;
use crate::session::DEFAULT_SESSION_ID;

#[derive(Deserialize)]
pub struct ChatPayload {
    #[serde(default)]
    session_id: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    model: Option<String>,
}

#[derive(Serialize)]
pub struct ChatReply {
    reply: String,
}

/// POST /chat
///
/// The body is parsed as JSON whatever its content type. Validation and model
/// errors leave the session untouched; once the user turn is recorded it stays
/// recorded even if the provider call fails.
pub async fn chat(State(state): State<AppState>, body: Bytes) -> Response {
    let payload: ChatPayload = match serde_json::from_slice(&body) {
        Ok(payload) => payload,
        Err(e) => return response::invalid_json(e.to_string()),
    };
    debug!(
        session = ?payload.session_id,
        model = ?payload.model,
        "Incoming chat payload"
    );

    let user_text = payload.message.as_deref().map(str::trim).unwrap_or_default();
    if user_text.is_empty() {
        return response::bad_request("no message provided");
    }

    let requested = payload.model.as_deref().unwrap_or(&state.default_model);
    let route = match state.models.resolve(Some(requested)) {
        Ok(route) => route.clone(),
        Err(ModelError::Invalid { message, allowed }) => {
            return response::invalid_model(message, allowed);
        }
        Err(e) => return response::server_error(e.to_string()),
    };

    let session_id = payload
        .session_id
        .unwrap_or_else(|| DEFAULT_SESSION_ID.to_string());

    // Held until the assistant turn is appended.
    let handle = state.sessions.get_or_create(&session_id);
    let mut conversation = handle.lock().await;
    conversation.push(Role::User, user_text);
    info!(
        session = %session_id,
        alias = %route.alias,
        provider = %route.provider,
        turns = conversation.len(),
        "Dispatching chat message"
    );

    let reply = match state.dispatcher.dispatch(&route, conversation.turns()).await {
        Ok(reply) => reply,
        Err(e) if e.is_auth() => return response::unauthorized(e.code(), e.to_string()),
        Err(e) => return response::bad_gateway(e.code(), e.to_string()),
    };

    conversation.push(Role::Assistant, reply.clone());
    debug!(session = %session_id, reply_len = reply.len(), "Recorded assistant reply");

    (StatusCode::OK, Json(ChatReply { reply })).into_response()
}
