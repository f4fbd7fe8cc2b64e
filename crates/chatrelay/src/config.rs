use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::Path;

use tokio::fs;

use serde::Deserialize;
use thiserror::Error;

use crate::llm::{ModelRoute, default_routes};

// ============================================================================
// Config (root)
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub providers: ProvidersConfig,
    #[serde(default = "default_routes")]
    pub models: Vec<ModelRoute>,
    /// Alias used when a chat request does not name a model.
    #[serde(default = "default_model")]
    pub default_model: String,
    #[serde(default)]
    pub sessions: SessionsConfig,
    #[serde(default)]
    pub transcription: TranscriptionConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            providers: ProvidersConfig::default(),
            models: default_routes(),
            default_model: default_model(),
            sessions: SessionsConfig::default(),
            transcription: TranscriptionConfig::default(),
        }
    }
}

impl Config {
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = match fs::read_to_string(path).await {
            Ok(c) => c,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(ConfigError::Io(e)),
        };
        Ok(serde_saphyr::from_str(&contents)?)
    }

    /// Override fields from the process environment.
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_env_from(|name| std::env::var(name).ok())
    }

    /// Override fields from `lookup`. Empty values are ignored.
    pub fn apply_env_from(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(url) = get("OPENROUTER_BASE_URL") {
            self.providers.openrouter.base_url = url;
        }
        if let Some(key) = get("OPENROUTER_API_KEY") {
            self.providers.openrouter.api_key = Some(key);
        }
        if let Some(url) = get("SAMBANOVA_BASE_URL") {
            self.providers.sambanova.base_url = url;
        }
        if let Some(key) = get("SAMBANOVA_API_KEY") {
            self.providers.sambanova.api_key = Some(key);
        }
        if let Some(url) = get("TRANSCRIPTION_BASE_URL") {
            self.transcription.base_url = url;
        }
        if let Some(key) = get("TRANSCRIPTION_API_KEY") {
            self.transcription.api_key = Some(key);
        }
        if let Some(host) = get("CHATRELAY_HOST") {
            self.server.host = host;
        }
        if let Some(port) = get("CHATRELAY_PORT") {
            self.server.port = port.trim().parse().map_err(|_| ConfigError::InvalidEnv {
                var: "CHATRELAY_PORT",
                value: port,
            })?;
        }
        Ok(())
    }
}

fn default_model() -> String {
    "chatgpt".to_string()
}

// ============================================================================
// ServerConfig
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout_seconds: default_request_timeout(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_request_timeout() -> u64 {
    300
}

// ============================================================================
// ProvidersConfig
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ProvidersConfig {
    #[serde(default = "default_openrouter")]
    pub openrouter: ProviderConfig,
    #[serde(default = "default_sambanova")]
    pub sambanova: ProviderConfig,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            openrouter: default_openrouter(),
            sambanova: default_sambanova(),
        }
    }
}

/// Connection settings for one OpenAI-compatible provider.
#[derive(Debug, Deserialize)]
pub struct ProviderConfig {
    pub base_url: String,
    #[serde(default)]
    pub api_key: Option<String>,
    /// Extra headers sent with every request.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

fn default_openrouter() -> ProviderConfig {
    ProviderConfig {
        base_url: "https://openrouter.ai/api/v1".to_string(),
        api_key: None,
        headers: BTreeMap::from([
            ("HTTP-Referer".to_string(), "https://example.com".to_string()),
            ("X-Title".to_string(), "Mobile Chat Proxy".to_string()),
        ]),
    }
}

fn default_sambanova() -> ProviderConfig {
    ProviderConfig {
        base_url: "https://api.sambanova.ai/v1".to_string(),
        api_key: None,
        headers: BTreeMap::new(),
    }
}

// ============================================================================
// SessionsConfig
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct SessionsConfig {
    /// System prompt seeded into every new session.
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,
    /// Maximum number of live sessions; the least recently used is evicted.
    #[serde(default = "default_capacity")]
    pub capacity: usize,
    /// Sessions idle longer than this are evicted. `0` disables.
    #[serde(default = "default_idle_ttl")]
    pub idle_ttl_seconds: u64,
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_seconds: u64,
}

impl Default for SessionsConfig {
    fn default() -> Self {
        Self {
            system_prompt: default_system_prompt(),
            capacity: default_capacity(),
            idle_ttl_seconds: default_idle_ttl(),
            sweep_interval_seconds: default_sweep_interval(),
        }
    }
}

fn default_system_prompt() -> String {
    "You are a helpful assistant.".to_string()
}

fn default_capacity() -> usize {
    1024
}

fn default_idle_ttl() -> u64 {
    3600
}

fn default_sweep_interval() -> u64 {
    60
}

// ============================================================================
// TranscriptionConfig
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct TranscriptionConfig {
    #[serde(default = "default_transcription_url")]
    pub base_url: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_transcription_model")]
    pub model: String,
    #[serde(default = "default_language")]
    pub language: String,
}

impl Default for TranscriptionConfig {
    fn default() -> Self {
        Self {
            base_url: default_transcription_url(),
            api_key: None,
            model: default_transcription_model(),
            language: default_language(),
        }
    }
}

fn default_transcription_url() -> String {
    "https://api.groq.com/openai/v1".to_string()
}

fn default_transcription_model() -> String {
    "whisper-large-v3".to_string()
}

fn default_language() -> String {
    "en".to_string()
}

// ============================================================================
// ConfigError
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Yaml(#[from] serde_saphyr::Error),

    #[error("invalid value for {var}: '{value}'")]
    InvalidEnv { var: &'static str, value: String },
}

// ============================================================================
// Tests
// ============================================================================
