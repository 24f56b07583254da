//! HTTP client for a whisper-style remote recognition service.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use super::{RecognizeError, SpeechRecognizer};

#[derive(Debug, Deserialize)]
struct RecognizeResponse {
    text: String,
}

/// Speech recognizer backed by an HTTP service that accepts multipart WAV
/// uploads on `POST /transcribe` with an optional `language` field and
/// answers `{"text": "..."}`.
pub struct HttpSpeechRecognizer {
    client: reqwest::Client,
    base_url: String,
}

impl HttpSpeechRecognizer {
    pub fn new(base_url: impl Into<String>, timeout_secs: u64) -> crate::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        let base_url: String = base_url.into();

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Cheap reachability probe for preflight checks.
    pub async fn health_check(&self) -> bool {
        let url = format!("{}/health", self.base_url);
        matches!(
            self.client.get(url).send().await,
            Ok(response) if response.status().is_success()
        )
    }
}

#[async_trait]
impl SpeechRecognizer for HttpSpeechRecognizer {
    async fn recognize<'a>(
        &self,
        audio: &Path,
        language: Option<&'a str>,
    ) -> Result<String, RecognizeError> {
        let bytes = fs_err::read(audio).map_err(|e| RecognizeError::Service(e.to_string()))?;
        let file_name = audio
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "audio.wav".to_string());

        let file_part = Part::bytes(bytes)
            .file_name(file_name)
            .mime_str("audio/wav")
            .map_err(|e| RecognizeError::Service(e.to_string()))?;
        let mut form = Form::new().part("file", file_part);
        if let Some(language) = language {
            form = form.text("language", language.to_string());
        }

        let url = format!("{}/transcribe", self.base_url);
        let response = self
            .client
            .post(url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| RecognizeError::Service(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(RecognizeError::Service(format!(
                "{status}: {}",
                body.trim()
            )));
        }

        let parsed: RecognizeResponse = response
            .json()
            .await
            .map_err(|e| RecognizeError::Service(e.to_string()))?;

        let text = parsed.text.trim().to_string();
        if text.is_empty() {
            return Err(RecognizeError::NoSpeech);
        }
        Ok(text)
    }
}
