//! Model alias registry.
//!
//! Callers name models by short aliases (`chatgpt`, `deepseek`, ...). Each
//! alias routes to one provider and one provider-specific model id.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::provider::Provider;

/// Where an alias sends its requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelRoute {
    pub alias: String,
    pub provider: Provider,
    pub model: String,
}

impl ModelRoute {
    pub fn new(alias: &str, provider: Provider, model: &str) -> Self {
        Self {
            alias: alias.to_string(),
            provider,
            model: model.to_string(),
        }
    }
}

/// Built-in alias table used when the config does not list any models.
pub fn default_routes() -> Vec<ModelRoute> {
    vec![
        ModelRoute::new("chatgpt", Provider::OpenRouter, "openai/gpt-4o-mini"),
        ModelRoute::new("claude", Provider::OpenRouter, "anthropic/claude-3.5-haiku"),
        ModelRoute::new("deepseek", Provider::SambaNova, "DeepSeek-V3-0324"),
        ModelRoute::new("gemini", Provider::OpenRouter, "google/gemini-2.0-flash-001"),
        ModelRoute::new(
            "llama",
            Provider::OpenRouter,
            "meta-llama/llama-3.3-70b-instruct",
        ),
    ]
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ModelError {
    #[error("{message}")]
    Invalid {
        message: String,
        allowed: Vec<String>,
    },

    #[error("duplicate model alias '{0}'")]
    DuplicateAlias(String),

    #[error("model alias must not be empty")]
    EmptyAlias,
}

/// Immutable alias table, keyed by lowercased alias.
#[derive(Debug, Clone)]
pub struct ModelRegistry {
    routes: BTreeMap<String, ModelRoute>,
}

impl ModelRegistry {
    pub fn new(routes: impl IntoIterator<Item = ModelRoute>) -> Result<Self, ModelError> {
        let mut table = BTreeMap::new();
        for mut route in routes {
            let key = route.alias.trim().to_lowercase();
            if key.is_empty() {
                return Err(ModelError::EmptyAlias);
            }
            if table.contains_key(&key) {
                return Err(ModelError::DuplicateAlias(key));
            }
            route.alias = key.clone();
            table.insert(key, route);
        }
        Ok(Self { routes: table })
    }

    /// Resolve a caller-supplied model string to a route.
    ///
    /// Exact alias match first, then the first alias (alphabetically) whose
    /// provider model id contains the input.
    pub fn resolve(&self, requested: Option<&str>) -> Result<&ModelRoute, ModelError> {
        let normalized = requested.map(|r| r.trim().to_lowercase()).unwrap_or_default();
        if normalized.is_empty() {
            return Err(self.invalid("no model specified".to_string()));
        }

        if let Some(route) = self.routes.get(&normalized) {
            return Ok(route);
        }

        self.routes
            .values()
            .find(|route| route.model.to_lowercase().contains(&normalized))
            .ok_or_else(|| self.invalid(format!("invalid model '{normalized}'")))
    }

    /// All routes, sorted by alias.
    pub fn routes(&self) -> impl Iterator<Item = &ModelRoute> {
        self.routes.values()
    }

    /// All aliases, sorted.
    pub fn aliases(&self) -> Vec<String> {
        self.routes.keys().cloned().collect()
    }

    fn invalid(&self, message: String) -> ModelError {
        ModelError::Invalid {
            message,
            allowed: self.aliases(),
        }
    }
}

impl Default for ModelRegistry {
    fn default() -> Self {
        Self {
            routes: default_routes()
                .into_iter()
                .map(|r| (r.alias.clone(), r))
                .collect(),
        }
    }
}
