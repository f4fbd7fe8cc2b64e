//! Chatrelay server entry point.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use chatrelay::config::Config;
use chatrelay::llm::{Dispatcher, ModelRegistry, ProviderRegistry, Transcriber, WhisperTranscriber};
use chatrelay::server::{AppState, build_app};
use chatrelay::session::{SessionLimits, SessionStore, spawn_eviction_task};

/// Chat proxy with per-session history in front of OpenRouter and SambaNova.
#[derive(Parser)]
#[command(name = "chatrelay", version, about, long_about = None)]
struct Cli {
    /// Path to the YAML config file. A missing file means built-in defaults.
    #[arg(short, long, env = "CHATRELAY_CONFIG", default_value = "chatrelay.yaml")]
    config: PathBuf,

    /// Bind host (overrides config and CHATRELAY_HOST)
    #[arg(long)]
    host: Option<String>,

    /// Bind port (overrides config and CHATRELAY_PORT)
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("chatrelay=info,tower_http=info")),
        )
        .init();

    let cli = Cli::parse();

    let mut config = Config::load(&cli.config)
        .await
        .with_context(|| format!("loading config from {}", cli.config.display()))?;
    config.apply_env().context("applying environment overrides")?;
    if let Some(host) = cli.host {
        config.server.host = host;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }

    let models = ModelRegistry::new(config.models.clone()).context("building model registry")?;
    models
        .resolve(Some(&config.default_model))
        .with_context(|| format!("default model '{}' is not a known alias", config.default_model))?;

    let client = reqwest::Client::new();
    let providers = ProviderRegistry::from_config(client.clone(), &config.providers);

    let transcriber: Option<Arc<dyn Transcriber>> = match config.transcription.api_key.clone() {
        Some(api_key) => Some(Arc::new(
            WhisperTranscriber::new(
                client,
                config.transcription.base_url.clone(),
                api_key,
                config.transcription.model.clone(),
            )
            .with_language(config.transcription.language.clone()),
        )),
        None => {
            warn!("No transcription API key configured, /listen is disabled");
            None
        }
    };

    let idle_ttl = (config.sessions.idle_ttl_seconds > 0)
        .then(|| Duration::from_secs(config.sessions.idle_ttl_seconds));
    let sessions = SessionStore::new(
        config.sessions.system_prompt.clone(),
        SessionLimits {
            capacity: config.sessions.capacity,
            idle_ttl,
        },
    );
    let eviction = idle_ttl.map(|_| {
        spawn_eviction_task(
            sessions.clone(),
            Duration::from_secs(config.sessions.sweep_interval_seconds.max(1)),
        )
    });

    let state = AppState {
        sessions,
        models: Arc::new(models),
        dispatcher: Dispatcher::new(providers),
        transcriber,
        default_model: config.default_model.clone(),
    };
    let app = build_app(state, config.server.request_timeout_seconds);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!(addr = %addr, "Chatrelay listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    if let Some(handle) = eviction {
        handle.abort();
    }
    info!("Chatrelay stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
