//! Play.ht text-to-speech client
//!
//! Asynchronous job API: create a job, poll its status a bounded number of
//! times at a fixed interval, then download the finished MP3.

use super::{SpeechSynthesizer, SynthError};
use crate::config::PlayHtConfig;
use crate::script::SpeakerId;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Serialize)]
struct CreateJobRequest<'a> {
    text: &'a str,
    voice: &'a str,
    quality: &'static str,
    output_format: &'static str,
    speed: f32,
    sample_rate: u32,
}

#[derive(Debug, Deserialize)]
struct CreateJobResponse {
    id: Option<String>,
}

/// Status document returned by `GET /tts/{id}`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JobStatus {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub output: Option<JobOutput>,
    #[serde(default)]
    pub error: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct JobOutput {
    #[serde(default)]
    pub url: Option<String>,
}

/// What to do after one status check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollStep {
    /// Audio ready at this URL
    Ready(String),
    Failed(String),
    Pending,
}

/// Decide the next step from a job status document
pub fn interpret_status(status: &JobStatus) -> PollStep {
    if let Some(url) = status
        .output
        .as_ref()
        .and_then(|o| o.url.as_deref())
        .filter(|u| !u.is_empty())
    {
        return PollStep::Ready(url.to_string());
    }

    if status.status.as_deref() == Some("error") {
        let message = match &status.error {
            Some(serde_json::Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
            None => "Unknown error".to_string(),
        };
        return PollStep::Failed(message);
    }

    PollStep::Pending
}

/// Play.ht API client
pub struct PlayHtClient {
    http_client: reqwest::Client,
    api_key: String,
    user_id: String,
    config: PlayHtConfig,
}

impl PlayHtClient {
    pub fn new(http_client: reqwest::Client, api_key: String, user_id: String, config: PlayHtConfig) -> Self {
        Self {
            http_client,
            api_key,
            user_id,
            config,
        }
    }

    fn base_url(&self) -> &str {
        self.config.base_url.trim_end_matches('/')
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .bearer_auth(&self.api_key)
            .header("X-User-ID", &self.user_id)
    }

    async fn create_job(&self, text: &str, voice: &str) -> Result<String, SynthError> {
        let response = self
            .authorized(self.http_client.post(format!("{}/tts", self.base_url())))
            .json(&CreateJobRequest {
                text,
                voice,
                quality: "premium",
                output_format: "mp3",
                speed: 1.0,
                sample_rate: 24000,
            })
            .send()
            .await
            .map_err(|e| SynthError::Network(e.to_string()))?;

        let status = response.status();
        if status != reqwest::StatusCode::CREATED {
            let error_text = response.text().await.unwrap_or_default();
            return Err(SynthError::Api(status.as_u16(), error_text));
        }

        let job: CreateJobResponse = response
            .json()
            .await
            .map_err(|e| SynthError::Parse(e.to_string()))?;
        job.id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| SynthError::Parse("no job id returned".to_string()))
    }

    /// Poll until the job yields an audio URL, fails, or the attempt bound is hit
    async fn wait_for_audio(&self, job_id: &str) -> Result<String, SynthError> {
        let status_url = format!("{}/tts/{}", self.base_url(), job_id);
        let attempts = self.config.poll_attempts;

        for attempt in 1..=attempts {
            let response = self
                .authorized(self.http_client.get(&status_url))
                .send()
                .await
                .map_err(|e| SynthError::Network(e.to_string()))?;

            if response.status() == reqwest::StatusCode::OK {
                let status: JobStatus = response
                    .json()
                    .await
                    .map_err(|e| SynthError::Parse(e.to_string()))?;

                match interpret_status(&status) {
                    PollStep::Ready(url) => return Ok(url),
                    PollStep::Failed(message) => return Err(SynthError::JobFailed(message)),
                    PollStep::Pending => {
                        debug!(job_id, attempt, "Play.ht job pending");
                    }
                }
            } else {
                debug!(job_id, attempt, status = %response.status(), "Play.ht status check not OK");
            }

            if attempt < attempts {
                tokio::time::sleep(Duration::from_millis(self.config.poll_interval_ms)).await;
            }
        }

        Err(SynthError::Timeout { attempts })
    }
}

#[async_trait]
impl SpeechSynthesizer for PlayHtClient {
    fn provider_name(&self) -> &'static str {
        "playht"
    }

    async fn synthesize(&self, text: &str, speaker: SpeakerId, dest: &Path) -> Result<(), SynthError> {
        let voice = self.config.voices.voice_for(speaker);
        debug!(voice = voice, chars = text.len(), "Creating Play.ht job");

        let job_id = self.create_job(text, voice).await?;
        let audio_url = self.wait_for_audio(&job_id).await?;

        let response = self
            .http_client
            .get(&audio_url)
            .send()
            .await
            .map_err(|e| SynthError::Network(e.to_string()))?;
        let status = response.status();
        if status != reqwest::StatusCode::OK {
            return Err(SynthError::Api(
                status.as_u16(),
                format!("audio download from {} failed", audio_url),
            ));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| SynthError::Network(e.to_string()))?;
        tokio::fs::write(dest, &bytes).await?;

        debug!(job_id = %job_id, bytes = bytes.len(), "Play.ht clip written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> JobStatus {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_ready_when_url_present() {
        let status = parse(r#"{"status":"complete","output":{"url":"https://cdn/x.mp3"}}"#);
        assert_eq!(interpret_status(&status), PollStep::Ready("https://cdn/x.mp3".into()));
    }

    #[test]
    fn test_error_status() {
        let status = parse(r#"{"status":"error","error":"voice not found"}"#);
        assert_eq!(interpret_status(&status), PollStep::Failed("voice not found".into()));

        let status = parse(r#"{"status":"error"}"#);
        assert_eq!(interpret_status(&status), PollStep::Failed("Unknown error".into()));
    }

    #[test]
    fn test_pending_states() {
        assert_eq!(interpret_status(&parse(r#"{"status":"generating"}"#)), PollStep::Pending);
        assert_eq!(interpret_status(&parse(r#"{"output":{"url":""}}"#)), PollStep::Pending);
        assert_eq!(interpret_status(&parse(r#"{"output":null}"#)), PollStep::Pending);
    }
}
