//! Configuration for duet-mix
//!
//! Loaded once at startup and passed by reference into the pipeline; nothing
//! here is mutated after [`Config::load`] returns.
//!
//! # Settings Sources Priority
//!
//! 1. Command-line arguments (--config, --provider)
//! 2. Environment variables (DUET_CONFIG, ELEVENLABS_API_KEY, PLAYHT_API_KEY, PLAYHT_USER_ID)
//! 3. TOML configuration file
//! 4. Built-in defaults (code constants)

use crate::audio::silence::TrimProfile;
use crate::error::{Error, Result};
use crate::script::SpeakerId;
use duet_common::config::{load_toml, resolve_config_source, ConfigSource};
use duet_common::FadeCurve;
use serde::Deserialize;
use std::path::Path;

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "DUET_CONFIG";

/// Complete runtime configuration
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub synthesis: SynthesisConfig,
    pub composition: CompositionConfig,
    pub logging: LoggingConfig,
}

/// Speech provider selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    #[value(name = "elevenlabs")]
    ElevenLabs,
    #[value(name = "playht")]
    PlayHt,
}

/// Voice id for each host
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct VoicePair {
    pub host_1: String,
    pub host_2: String,
}

impl VoicePair {
    pub fn voice_for(&self, speaker: SpeakerId) -> &str {
        match speaker {
            SpeakerId::A => &self.host_1,
            SpeakerId::B => &self.host_2,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SynthesisConfig {
    pub provider: ProviderKind,

    /// Retry a failed Play.ht segment once on ElevenLabs
    pub fallback_to_elevenlabs: bool,

    /// Per-request HTTP timeout
    pub request_timeout_secs: u64,

    pub elevenlabs: ElevenLabsConfig,
    pub playht: PlayHtConfig,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::ElevenLabs,
            fallback_to_elevenlabs: true,
            request_timeout_secs: 60,
            elevenlabs: ElevenLabsConfig::default(),
            playht: PlayHtConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ElevenLabsConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model_id: String,
    pub voices: VoicePair,
}

impl Default for ElevenLabsConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.elevenlabs.io/v1".to_string(),
            model_id: "eleven_monolingual_v1".to_string(),
            voices: VoicePair {
                host_1: "21m00Tcm4TlvDq8ikWAM".to_string(),
                host_2: "MF3mGyEYCl7XYWbV9V6O".to_string(),
            },
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PlayHtConfig {
    pub api_key: Option<String>,
    pub user_id: Option<String>,
    pub base_url: String,
    pub voices: VoicePair,

    /// Maximum number of status checks before a job counts as timed out
    pub poll_attempts: u32,

    /// Fixed delay between status checks
    pub poll_interval_ms: u64,
}

impl Default for PlayHtConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            user_id: None,
            base_url: "https://api.play.ht/api/v2".to_string(),
            voices: VoicePair {
                host_1: "jennifer".to_string(),
                host_2: "michael".to_string(),
            },
            poll_attempts: 30,
            poll_interval_ms: 1000,
        }
    }
}

/// Join timing and level settings for the compositor and its fallbacks
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CompositionConfig {
    /// Enable the adaptive (trim/normalize/timing-aware) compositor
    pub adaptive: bool,

    pub gentle: TrimProfile,
    pub standard: TrimProfile,

    /// Clips with index 1..=gentle_window get the gentle profile (clip 0 always does)
    pub gentle_window: usize,

    /// Loudness every clip is normalized to, in dBFS
    pub target_dbfs: f32,

    /// Silence inserted before a Normal join
    pub pause_ms: u64,

    /// Crossfade window at a Normal join
    pub crossfade_ms: u64,
    pub fade_curve: FadeCurve,

    /// Overlap join: window = min(cap, clip / divisor, composite / 2)
    pub overlap_cap_ms: u64,
    pub overlap_clip_divisor: f32,

    /// Overlap windows at or below this are joined back-to-back
    pub overlap_min_ms: u64,

    /// Simultaneous join: backup = min(cap, composite / 3, clip)
    pub simultaneous_cap_ms: u64,

    pub fallback: SimpleJoinConfig,

    /// External concatenation tool used when in-process joining fails
    pub concat_tool: String,

    pub mp3_bitrate_kbps: u32,
}

impl Default for CompositionConfig {
    fn default() -> Self {
        Self {
            adaptive: true,
            gentle: TrimProfile::gentle(),
            standard: TrimProfile::standard(),
            gentle_window: 3,
            target_dbfs: -20.0,
            pause_ms: 400,
            crossfade_ms: 100,
            fade_curve: FadeCurve::Linear,
            overlap_cap_ms: 2000,
            overlap_clip_divisor: 1.5,
            overlap_min_ms: 100,
            simultaneous_cap_ms: 1000,
            fallback: SimpleJoinConfig::default(),
            concat_tool: "ffmpeg".to_string(),
            mp3_bitrate_kbps: 192,
        }
    }
}

/// Probabilistic join used when the adaptive compositor is unavailable or fails
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SimpleJoinConfig {
    pub overlap_probability: f64,
    pub overlap_cap_ms: u64,
    pub gap_ms: u64,
    pub min_composite_ms: u64,
    pub min_clip_ms: u64,

    /// Fixed RNG seed for reproducible output
    pub seed: Option<u64>,
}

impl Default for SimpleJoinConfig {
    fn default() -> Self {
        Self {
            overlap_probability: 0.2,
            overlap_cap_ms: 1500,
            gap_ms: 500,
            min_composite_ms: 2000,
            min_clip_ms: 1000,
            seed: None,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Config {
    /// Resolve, load, apply environment overrides and validate
    ///
    /// Runs before logging is installed; callers report the returned source.
    pub fn load(cli_path: Option<&Path>) -> Result<(Self, ConfigSource)> {
        let source = resolve_config_source(cli_path, CONFIG_ENV_VAR)?;
        let mut config: Config = load_toml(&source)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok((config, source))
    }

    /// Fill API credentials from the environment when the file leaves them unset
    pub fn apply_env_overrides(&mut self) {
        fn env_if_missing(slot: &mut Option<String>, var: &str) {
            if slot.as_deref().map_or(true, str::is_empty) {
                if let Ok(value) = std::env::var(var) {
                    if !value.is_empty() {
                        *slot = Some(value);
                    }
                }
            }
        }

        env_if_missing(&mut self.synthesis.elevenlabs.api_key, "ELEVENLABS_API_KEY");
        env_if_missing(&mut self.synthesis.playht.api_key, "PLAYHT_API_KEY");
        env_if_missing(&mut self.synthesis.playht.user_id, "PLAYHT_USER_ID");
    }

    /// Reject values the pipeline cannot work with
    pub fn validate(&self) -> Result<()> {
        let c = &self.composition;
        if !(0.0..=1.0).contains(&c.fallback.overlap_probability) {
            return Err(Error::Config(format!(
                "composition.fallback.overlap_probability must be within 0..=1, got {}",
                c.fallback.overlap_probability
            )));
        }
        if c.overlap_clip_divisor < 1.0 {
            return Err(Error::Config(format!(
                "composition.overlap_clip_divisor must be >= 1, got {}",
                c.overlap_clip_divisor
            )));
        }
        for (name, profile) in [("gentle", &c.gentle), ("standard", &c.standard)] {
            if profile.threshold_db > 0.0 {
                return Err(Error::Config(format!(
                    "composition.{}.threshold_db must be negative dBFS, got {}",
                    name, profile.threshold_db
                )));
            }
            if profile.min_silence_ms == 0 {
                return Err(Error::Config(format!(
                    "composition.{}.min_silence_ms must be > 0",
                    name
                )));
            }
        }
        crate::audio::encoder::bitrate_from_kbps(c.mp3_bitrate_kbps)?;
        if self.synthesis.playht.poll_attempts == 0 {
            return Err(Error::Config(
                "synthesis.playht.poll_attempts must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}
