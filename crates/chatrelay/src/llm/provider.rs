//! LLM provider trait and provider identities.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::error::LLMError;
use super::reply::{ChatCompletionsAdapter, ReplyAdapter};
use super::types::ChatRequest;

/// Trait for upstream chat completion clients.
#[async_trait]
pub trait LLMProvider: Send + Sync {
    /// Make a chat completion request.
    ///
    /// Returns the raw response body. Bodies that are not JSON come back as a
    /// JSON string so the reply adapter still gets a chance at them.
    async fn chat(&self, request: ChatRequest) -> Result<serde_json::Value, LLMError>;
}

/// Upstream providers a model alias can route to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    OpenRouter,
    SambaNova,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::OpenRouter => "openrouter",
            Provider::SambaNova => "sambanova",
        }
    }

    /// Error code returned when the provider has no credential configured.
    pub fn missing_key_code(&self) -> &'static str {
        match self {
            Provider::OpenRouter => "missing_openrouter_key",
            Provider::SambaNova => "missing_samba_key",
        }
    }

    /// Error code returned when the provider rejects the credential.
    pub fn auth_invalid_code(&self) -> &'static str {
        match self {
            Provider::OpenRouter => "openrouter_auth_invalid",
            Provider::SambaNova => "sambanova_auth_invalid",
        }
    }

    /// Error code returned for any other failed call.
    pub fn call_error_code(&self) -> &'static str {
        match self {
            Provider::OpenRouter => "openrouter_error",
            Provider::SambaNova => "sambanova_error",
        }
    }

    /// Environment variable holding the provider credential.
    pub fn api_key_env(&self) -> &'static str {
        match self {
            Provider::OpenRouter => "OPENROUTER_API_KEY",
            Provider::SambaNova => "SAMBANOVA_API_KEY",
        }
    }

    /// The adapter that turns this provider's completion bodies into text.
    pub fn reply_adapter(&self) -> &'static dyn ReplyAdapter {
        match self {
            // Both speak the OpenAI chat completions format.
            Provider::OpenRouter | Provider::SambaNova => &ChatCompletionsAdapter,
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
