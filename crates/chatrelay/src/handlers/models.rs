use axum::Json;
use axum::extract::State;
use serde::Serialize;

use crate::llm::Provider;
use crate::server::AppState;

#[derive(Serialize)]
pub struct ModelInfo {
    name: String,
    id: String,
    provider: Provider,
}

#[derive(Serialize)]
pub struct ListModelsResponse {
    models: Vec<ModelInfo>,
}

/// GET /models
///
/// Aliases come back sorted alphabetically.
pub async fn list_models(State(state): State<AppState>) -> Json<ListModelsResponse> {
    let models = state
        .models
        .routes()
        .map(|route| ModelInfo {
            name: route.alias.clone(),
            id: route.model.clone(),
            provider: route.provider,
        })
        .collect();

    Json(ListModelsResponse { models })
}
