//! Speech synthesis providers
//!
//! One clip file per segment. Only `(text, speaker)` crosses this boundary;
//! timing tags stay with the compositor. Speaker → voice mapping comes from
//! [`SynthesisConfig`].

mod elevenlabs;
mod playht;

pub use elevenlabs::ElevenLabsClient;
pub use playht::{interpret_status, JobStatus, PlayHtClient, PollStep};

use crate::config::{ProviderKind, SynthesisConfig};
use crate::error::{Error, Result};
use crate::script::SpeakerId;
use async_trait::async_trait;
use std::path::Path;
use thiserror::Error;
use tracing::{info, warn};

const USER_AGENT: &str = concat!("duet-mix/", env!("CARGO_PKG_VERSION"));

/// Speech provider errors
#[derive(Debug, Error)]
pub enum SynthError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error {0}: {1}")]
    Api(u16, String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Job failed: {0}")]
    JobFailed(String),

    #[error("Job not finished after {attempts} status checks")]
    Timeout { attempts: u32 },

    #[error("Failed to write clip: {0}")]
    Io(#[from] std::io::Error),
}

/// Text-to-speech provider
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Provider identifier used in logs
    fn provider_name(&self) -> &'static str;

    /// Synthesize `text` in `speaker`'s voice and write the encoded clip to `dest`
    async fn synthesize(&self, text: &str, speaker: SpeakerId, dest: &Path) -> std::result::Result<(), SynthError>;
}

/// Primary provider with a one-shot retry on a secondary provider
pub struct ProviderWithFallback {
    primary: Box<dyn SpeechSynthesizer>,
    fallback: Box<dyn SpeechSynthesizer>,
}

impl ProviderWithFallback {
    pub fn new(primary: Box<dyn SpeechSynthesizer>, fallback: Box<dyn SpeechSynthesizer>) -> Self {
        Self { primary, fallback }
    }
}

#[async_trait]
impl SpeechSynthesizer for ProviderWithFallback {
    fn provider_name(&self) -> &'static str {
        self.primary.provider_name()
    }

    async fn synthesize(&self, text: &str, speaker: SpeakerId, dest: &Path) -> std::result::Result<(), SynthError> {
        match self.primary.synthesize(text, speaker, dest).await {
            Ok(()) => Ok(()),
            Err(e) => {
                warn!(
                    primary = self.primary.provider_name(),
                    fallback = self.fallback.provider_name(),
                    error = %e,
                    "Speech provider failed, retrying segment on fallback"
                );
                self.fallback.synthesize(text, speaker, dest).await
            }
        }
    }
}

fn http_client(timeout_secs: u64) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| Error::Provider(format!("Failed to build HTTP client: {}", e)))
}

fn required(value: &Option<String>, what: &str, env: &str) -> Result<String> {
    match value.as_deref() {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(Error::Config(format!(
            "{} is not configured (set it in the config file or {})",
            what, env
        ))),
    }
}

/// Build the configured provider
///
/// Play.ht is wrapped with an ElevenLabs fallback when enabled and an
/// ElevenLabs key is available.
pub fn build_synthesizer(config: &SynthesisConfig) -> Result<Box<dyn SpeechSynthesizer>> {
    let http = http_client(config.request_timeout_secs)?;

    let elevenlabs = |key: String| {
        ElevenLabsClient::new(http.clone(), key, config.elevenlabs.clone())
    };

    match config.provider {
        ProviderKind::ElevenLabs => {
            let key = required(
                &config.elevenlabs.api_key,
                "ElevenLabs API key",
                "ELEVENLABS_API_KEY",
            )?;
            info!("Speech provider: ElevenLabs");
            Ok(Box::new(elevenlabs(key)))
        }
        ProviderKind::PlayHt => {
            let key = required(&config.playht.api_key, "Play.ht API key", "PLAYHT_API_KEY")?;
            let user = required(&config.playht.user_id, "Play.ht user id", "PLAYHT_USER_ID")?;
            let playht = PlayHtClient::new(http.clone(), key, user, config.playht.clone());

            let fallback_key = config
                .elevenlabs
                .api_key
                .as_deref()
                .filter(|k| !k.is_empty())
                .map(str::to_string);
            match (config.fallback_to_elevenlabs, fallback_key) {
                (true, Some(key)) => {
                    info!("Speech provider: Play.ht (ElevenLabs fallback)");
                    Ok(Box::new(ProviderWithFallback::new(
                        Box::new(playht),
                        Box::new(elevenlabs(key)),
                    )))
                }
                (true, None) => {
                    warn!("Play.ht fallback disabled: no ElevenLabs API key configured");
                    Ok(Box::new(playht))
                }
                (false, _) => {
                    info!("Speech provider: Play.ht");
                    Ok(Box::new(playht))
                }
            }
        }
    }
}
