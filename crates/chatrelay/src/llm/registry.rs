//! Provider registry for managing LLM provider instances.

use std::collections::HashMap;
use std::sync::Arc;

use reqwest::Client;
use tracing::{info, warn};

use super::openai::OpenAICompatibleProvider;
use super::provider::{LLMProvider, Provider};
use crate::config::{ProviderConfig, ProvidersConfig};

/// Registry of LLM providers, keyed by provider identity.
///
/// A provider without a configured credential is never registered, so
/// routing to it fails before any network call is made.
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    providers: HashMap<Provider, Arc<dyn LLMProvider>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build providers from config, sharing one HTTP client.
    pub fn from_config(client: Client, config: &ProvidersConfig) -> Self {
        let mut registry = Self::new();

        for (provider, provider_config) in [
            (Provider::OpenRouter, &config.openrouter),
            (Provider::SambaNova, &config.sambanova),
        ] {
            match build_provider(client.clone(), provider_config) {
                Some(implementation) => {
                    info!(
                        provider = %provider,
                        base_url = %provider_config.base_url,
                        "Registered provider"
                    );
                    registry.register(provider, Arc::new(implementation));
                }
                None => warn!(
                    provider = %provider,
                    "No API key configured ({}), models routed to this provider are disabled",
                    provider.api_key_env()
                ),
            }
        }

        registry
    }

    /// Register a provider implementation.
    pub fn register(&mut self, provider: Provider, implementation: Arc<dyn LLMProvider>) {
        self.providers.insert(provider, implementation);
    }

    /// Get a provider by identity.
    pub fn get(&self, provider: Provider) -> Option<Arc<dyn LLMProvider>> {
        self.providers.get(&provider).cloned()
    }

    pub fn is_registered(&self, provider: Provider) -> bool {
        self.providers.contains_key(&provider)
    }
}

fn build_provider(client: Client, config: &ProviderConfig) -> Option<OpenAICompatibleProvider> {
    let api_key = config.api_key.as_deref().map(str::trim).filter(|k| !k.is_empty())?;

    let provider = config.headers.iter().fold(
        OpenAICompatibleProvider::new(client, config.base_url.clone(), Some(api_key.to_string())),
        |provider, (name, value)| provider.with_header(name, value),
    );
    Some(provider)
}
