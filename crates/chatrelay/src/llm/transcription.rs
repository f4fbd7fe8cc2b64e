//! Speech-to-text via OpenAI-compatible Whisper endpoints.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use super::error::{LLMError, check_response_error};

/// Trait for speech-to-text transcription providers.
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Transcribe raw audio bytes to text.
    async fn transcribe(&self, audio: Vec<u8>) -> Result<String, LLMError>;
}

/// Client for `POST {base_url}/audio/transcriptions` (Groq, OpenAI, ...).
pub struct WhisperTranscriber {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    language: Option<String>,
}

#[derive(Deserialize)]
struct TranscriptionResponse {
    #[serde(default)]
    text: String,
}

impl WhisperTranscriber {
    #[must_use]
    pub fn new(client: Client, base_url: String, api_key: String, model: String) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            model,
            language: None,
        }
    }

    #[must_use]
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }
}

#[async_trait]
impl Transcriber for WhisperTranscriber {
    async fn transcribe(&self, audio: Vec<u8>) -> Result<String, LLMError> {
        let url = format!("{}/audio/transcriptions", self.base_url);
        debug!(url = %url, model = %self.model, bytes = audio.len(), "transcribing audio");

        let file_part = reqwest::multipart::Part::bytes(audio)
            .file_name("audio")
            .mime_str("application/octet-stream")?;

        let mut form = reqwest::multipart::Form::new()
            .part("file", file_part)
            .text("model", self.model.clone());
        if let Some(ref language) = self.language {
            form = form.text("language", language.clone());
        }

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await?;

        if let Some(err) = check_response_error(&response) {
            return Err(err);
        }
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(LLMError::Api { status, message });
        }

        let body: TranscriptionResponse = response.json().await?;
        Ok(body.text.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn transcriber(server: &MockServer) -> WhisperTranscriber {
        WhisperTranscriber::new(
            Client::new(),
            server.uri(),
            "groq-key".to_string(),
            "whisper-large-v3".to_string(),
        )
        .with_language("en")
    }

    #[tokio::test]
    async fn returns_trimmed_text() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/audio/transcriptions"))
            .and(header("Authorization", "Bearer groq-key"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"text": "  hello world \n"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let text = transcriber(&server).transcribe(vec![1, 2, 3]).await.unwrap();
        assert_eq!(text, "hello world");
    }

    #[tokio::test]
    async fn upstream_error_is_propagated() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/audio/transcriptions"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let err = transcriber(&server).transcribe(vec![0]).await.unwrap_err();
        assert!(matches!(err, LLMError::Api { status: 500, .. }));
    }
}
