//! Chatrelay - a thin chat proxy in front of OpenAI-compatible LLM providers.

// ============================================================================
// Always Available
// ============================================================================

pub mod config;
pub mod llm;
pub mod session;

// ============================================================================
// Server-only (behind `server` feature)
// ============================================================================

#[cfg(feature = "server")]
pub mod handlers;
#[cfg(feature = "server")]
pub mod response;
#[cfg(feature = "server")]
pub mod server;
