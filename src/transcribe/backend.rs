use anyhow::{Context, Result};
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use tracing::debug;

use crate::config::StreamingConfig;

/// Speech-to-text backend abstraction.
///
/// Production uses the HTTP implementation below; tests substitute a mock to
/// drive the pipeline without network access.
#[async_trait::async_trait]
pub trait TranscriptionBackend: Send + Sync {
    /// Transcribe a WAV-encoded mono 16-bit PCM clip. `language` is a hint
    /// tag such as "hi-IN".
    async fn transcribe(&self, wav: Vec<u8>, language: &str) -> Result<String>;

    /// Backend name for logging.
    fn name(&self) -> &str;
}

#[derive(Debug, Deserialize)]
struct TranscribeResponse {
    #[serde(default)]
    transcript: String,
}

/// Accuracy parameters attached to every backend request. The punctuation,
/// casing, and ITN features default on; the rest are omitted unless
/// configured.
fn request_params(cfg: &StreamingConfig) -> Vec<(&'static str, String)> {
    let mut params = vec![
        ("enable_punctuation", cfg.enable_punctuation.to_string()),
        ("enable_casing", cfg.enable_casing.to_string()),
        ("enable_itn", cfg.enable_itn.to_string()),
    ];

    if let Some(v) = cfg.diarization {
        params.push(("diarization", v.to_string()));
    }
    if let Some(v) = cfg.translate {
        params.push(("translate", v.to_string()));
    }
    if let Some(v) = &cfg.target_language_code {
        params.push(("target_language_code", v.clone()));
    }
    if let Some(v) = &cfg.custom_vocabulary {
        params.push(("custom_vocabulary", v.clone()));
    }

    params
}

/// HTTP transcription backend: multipart POST of the WAV clip plus a
/// language hint, authenticated with a subscription key header.
pub struct HttpTranscriptionBackend {
    client: reqwest::Client,
    url: String,
    api_key: String,
    params: Vec<(&'static str, String)>,
}

impl HttpTranscriptionBackend {
    pub fn new(cfg: &StreamingConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(cfg.request_timeout())
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            url: cfg.api_url.clone(),
            api_key: cfg.api_key.clone(),
            params: request_params(cfg),
        })
    }
}

#[async_trait::async_trait]
impl TranscriptionBackend for HttpTranscriptionBackend {
    async fn transcribe(&self, wav: Vec<u8>, language: &str) -> Result<String> {
        debug!(
            "Sending {} byte clip to {} (language: {})",
            wav.len(),
            self.url,
            language
        );

        let audio_part = Part::bytes(wav)
            .file_name("audio.wav")
            .mime_str("audio/wav")
            .context("Failed to create audio part")?;

        let mut form = Form::new()
            .part("file", audio_part)
            .text("language_code", language.to_string());

        for (key, value) in &self.params {
            form = form.text(*key, value.clone());
        }

        let response = self
            .client
            .post(&self.url)
            .header("API-Subscription-Key", &self.api_key)
            .multipart(form)
            .send()
            .await
            .context("Transcription request failed")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Transcription backend returned {}: {}", status, body);
        }

        let parsed: TranscribeResponse = response
            .json()
            .await
            .context("Failed to parse transcription response")?;

        Ok(parsed.transcript)
    }

    fn name(&self) -> &str {
        "http"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accuracy_features_default_on() {
        let params = request_params(&StreamingConfig::default());
        assert_eq!(
            params,
            vec![
                ("enable_punctuation", "true".to_string()),
                ("enable_casing", "true".to_string()),
                ("enable_itn", "true".to_string()),
            ]
        );
    }

    #[test]
    fn optional_features_appear_only_when_configured() {
        let cfg = StreamingConfig {
            enable_itn: false,
            diarization: Some(true),
            translate: Some(false),
            target_language_code: Some("en-IN".to_string()),
            custom_vocabulary: Some("Sarvam,Transcripter".to_string()),
            ..StreamingConfig::default()
        };

        let params = request_params(&cfg);
        assert!(params.contains(&("enable_itn", "false".to_string())));
        assert!(params.contains(&("diarization", "true".to_string())));
        assert!(params.contains(&("translate", "false".to_string())));
        assert!(params.contains(&("target_language_code", "en-IN".to_string())));
        assert!(params.contains(&("custom_vocabulary", "Sarvam,Transcripter".to_string())));
    }
}
