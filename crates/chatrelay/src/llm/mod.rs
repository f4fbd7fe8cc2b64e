//! LLM provider clients, model routing and reply extraction.

mod dispatch;
mod error;
mod models;
mod openai;
mod provider;
mod registry;
mod reply;
mod transcription;
mod types;

pub use dispatch::{DispatchError, Dispatcher};
pub use error::{LLMError, check_response_error};
pub use models::{ModelError, ModelRegistry, ModelRoute, default_routes};
pub use openai::OpenAICompatibleProvider;
pub use provider::{LLMProvider, Provider};
pub use registry::ProviderRegistry;
pub use reply::{ChatCompletionsAdapter, EMPTY_REPLY, ReplyAdapter, extract_reply};
pub use transcription::{Transcriber, WhisperTranscriber};
pub use types::{ChatRequest, ChatResponse, Choice, ChoiceMessage, Message, Role};
