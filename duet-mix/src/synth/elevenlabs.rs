//! ElevenLabs text-to-speech client
//!
//! Single request per clip: `POST {base}/text-to-speech/{voice}` returns the
//! MP3 body directly.

use super::{SpeechSynthesizer, SynthError};
use crate::config::ElevenLabsConfig;
use crate::script::SpeakerId;
use async_trait::async_trait;
use serde::Serialize;
use std::path::Path;

/// Expressive but stable delivery for conversational speech
const VOICE_SETTINGS: VoiceSettings = VoiceSettings {
    stability: 0.3,
    similarity_boost: 0.7,
    style: 0.8,
    use_speaker_boost: true,
};

#[derive(Debug, Clone, Copy, Serialize)]
struct VoiceSettings {
    stability: f32,
    similarity_boost: f32,
    style: f32,
    use_speaker_boost: bool,
}

#[derive(Debug, Serialize)]
struct TtsRequest<'a> {
    text: &'a str,
    model_id: &'a str,
    voice_settings: VoiceSettings,
}

/// ElevenLabs API client
pub struct ElevenLabsClient {
    http_client: reqwest::Client,
    api_key: String,
    config: ElevenLabsConfig,
}

impl ElevenLabsClient {
    pub fn new(http_client: reqwest::Client, api_key: String, config: ElevenLabsConfig) -> Self {
        Self {
            http_client,
            api_key,
            config,
        }
    }
}

#[async_trait]
impl SpeechSynthesizer for ElevenLabsClient {
    fn provider_name(&self) -> &'static str {
        "elevenlabs"
    }

    async fn synthesize(&self, text: &str, speaker: SpeakerId, dest: &Path) -> Result<(), SynthError> {
        let voice = self.config.voices.voice_for(speaker);
        let url = format!(
            "{}/text-to-speech/{}",
            self.config.base_url.trim_end_matches('/'),
            voice
        );

        tracing::debug!(
            voice = voice,
            chars = text.len(),
            "Requesting ElevenLabs speech"
        );

        let response = self
            .http_client
            .post(&url)
            .header("xi-api-key", &self.api_key)
            .header(reqwest::header::ACCEPT, "audio/mpeg")
            .json(&TtsRequest {
                text,
                model_id: &self.config.model_id,
                voice_settings: VOICE_SETTINGS,
            })
            .send()
            .await
            .map_err(|e| SynthError::Network(e.to_string()))?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            let error_text = response.text().await.unwrap_or_default();
            return Err(SynthError::Api(status.as_u16(), error_text));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| SynthError::Network(e.to_string()))?;
        tokio::fs::write(dest, &bytes).await?;

        tracing::debug!(
            dest = %dest.display(),
            bytes = bytes.len(),
            "ElevenLabs clip written"
        );
        Ok(())
    }
}
