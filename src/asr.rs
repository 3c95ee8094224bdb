//! Speech-to-text collaborator
//!
//! The pipeline only needs text and a detected language out of an audio
//! payload, so the port is a single async method. The HTTP implementation
//! talks to a Whisper-style transcription service over JSON; the mock is
//! for tests and offline demo runs.

use async_trait::async_trait;
use base64::Engine;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{error, info};

use crate::error::AssistantError;
use crate::models::Language;

/// Transcription result. `language` is whatever the engine detected,
/// which may fall outside the supported set.
#[derive(Debug, Clone)]
pub struct Transcription {
    pub text: String,
    pub language: Option<Language>,
}

#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Transcribe raw audio bytes. A `None` hint asks the engine to
    /// autodetect the spoken language.
    async fn transcribe(
        &self,
        audio: &[u8],
        language_hint: Option<Language>,
    ) -> crate::Result<Transcription>;
}

//
// ================= HTTP Transcriber =================
//

/// Client for a JSON transcription endpoint (connection-pooled).
pub struct HttpTranscriber {
    client: Client,
    endpoint: String,
}

#[derive(Debug, Serialize)]
struct TranscribeRequest {
    audio: String,
    language: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TranscribeResponse {
    text: String,
    language: Option<String>,
}

impl HttpTranscriber {
    pub fn new(endpoint: String) -> Self {
        let client = Client::builder()
            .pool_idle_timeout(Duration::from_secs(90))
            .timeout(Duration::from_secs(60))
            .build()
            .expect("Failed to build HTTP client");

        Self { client, endpoint }
    }
}

#[async_trait]
impl Transcriber for HttpTranscriber {
    async fn transcribe(
        &self,
        audio: &[u8],
        language_hint: Option<Language>,
    ) -> crate::Result<Transcription> {
        let request = TranscribeRequest {
            audio: base64::engine::general_purpose::STANDARD.encode(audio),
            language: language_hint.map(|lang| lang.code().to_string()),
        };

        info!(
            bytes = audio.len(),
            hint = ?language_hint,
            "Sending audio for transcription"
        );

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                error!("Transcription request failed: {}", e);
                AssistantError::TranscriptionError(format!("ASR request error: {}", e))
            })?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!("Transcription service error response: {}", error_text);
            return Err(AssistantError::TranscriptionError(format!(
                "ASR service error: {}",
                error_text
            )));
        }

        let body: TranscribeResponse = response.json().await.map_err(|e| {
            AssistantError::TranscriptionError(format!("ASR parse error: {}", e))
        })?;

        Ok(Transcription {
            text: body.text,
            language: body.language.as_deref().and_then(Language::parse),
        })
    }
}

//
// ================= Mock Transcriber =================
//

/// Scriptable transcriber for tests and the demo binary.
pub struct MockTranscriber {
    pub text: String,
    pub language: Option<Language>,
    pub fail: bool,
}

impl MockTranscriber {
    pub fn new(text: &str, language: Option<Language>) -> Self {
        Self {
            text: text.to_string(),
            language,
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            text: String::new(),
            language: None,
            fail: true,
        }
    }
}

#[async_trait]
impl Transcriber for MockTranscriber {
    async fn transcribe(
        &self,
        _audio: &[u8],
        _language_hint: Option<Language>,
    ) -> crate::Result<Transcription> {
        if self.fail {
            return Err(AssistantError::TranscriptionError(
                "mock transcriber unavailable".to_string(),
            ));
        }
        Ok(Transcription {
            text: self.text.clone(),
            language: self.language,
        })
    }
}
