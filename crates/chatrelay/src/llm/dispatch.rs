//! Provider dispatch: route a conversation to its provider and get text back.

use thiserror::Error;
use tracing::{debug, warn};

use super::models::ModelRoute;
use super::provider::Provider;
use super::registry::ProviderRegistry;
use super::reply::extract_reply;
use super::types::{ChatRequest, Message};

/// Why a dispatch produced no reply.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("{provider} api key not configured")]
    MissingCredential { provider: Provider },

    #[error("{provider} rejected the api key: {message}")]
    InvalidCredential { provider: Provider, message: String },

    #[error("{provider} request failed: {details}")]
    Provider { provider: Provider, details: String },
}

impl DispatchError {
    /// Machine-readable error code for API responses.
    pub fn code(&self) -> &'static str {
        match self {
            DispatchError::MissingCredential { provider } => provider.missing_key_code(),
            DispatchError::InvalidCredential { provider, .. } => provider.auth_invalid_code(),
            DispatchError::Provider { provider, .. } => provider.call_error_code(),
        }
    }

    pub fn is_auth(&self) -> bool {
        !matches!(self, DispatchError::Provider { .. })
    }
}

/// Sends conversations to the provider a route points at.
#[derive(Clone)]
pub struct Dispatcher {
    providers: ProviderRegistry,
}

impl Dispatcher {
    pub fn new(providers: ProviderRegistry) -> Self {
        Self { providers }
    }

    /// Issue exactly one completion call for `conversation` and return the reply text.
    pub async fn dispatch(
        &self,
        route: &ModelRoute,
        conversation: &[Message],
    ) -> Result<String, DispatchError> {
        let provider = route.provider;
        let Some(client) = self.providers.get(provider) else {
            warn!(
                provider = %provider,
                alias = %route.alias,
                "provider has no credential configured"
            );
            return Err(DispatchError::MissingCredential { provider });
        };

        let request = ChatRequest::new(route.model.clone(), conversation.to_vec());
        let completion = match client.chat(request).await {
            Ok(completion) => completion,
            Err(e) if e.is_auth_failure() => {
                warn!(provider = %provider, error = %e, "provider rejected credential");
                return Err(DispatchError::InvalidCredential {
                    provider,
                    message: e.to_string(),
                });
            }
            Err(e) => {
                warn!(
                    provider = %provider,
                    model = %route.model,
                    error = %e,
                    "provider call failed"
                );
                return Err(DispatchError::Provider {
                    provider,
                    details: e.to_string(),
                });
            }
        };

        debug!(provider = %provider, completion = %completion, "raw completion");
        Ok(extract_reply(provider.reply_adapter(), &completion))
    }
}
