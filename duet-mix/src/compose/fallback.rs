//! Composition fallback chain
//!
//! Tiers are tried in order until one writes the output file:
//! 1. adaptive: trim, normalize and join by timing tag
//! 2. probabilistic: raw clips, 500ms gaps, occasional random overlap
//! 3. external concat: stream copy through an external tool
//! 4. copy first: the first clip alone
//!
//! A tier that is unavailable or fails hands over to the next one; every
//! attempt is recorded in the [`ChainReport`].

use super::sequencer::Sequencer;
use super::ClipInput;
use crate::audio::{encode_to_file, AudioClip, ClipDecoder};
use crate::config::{CompositionConfig, SimpleJoinConfig};
use crate::error::{Error, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::path::{Path, PathBuf};
use std::process::Command;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Why a tier did not produce output
#[derive(Debug, Error)]
pub enum TierError {
    /// Required capability missing (disabled, tool not installed)
    #[error("unavailable: {0}")]
    Unavailable(String),

    /// Tier ran and failed
    #[error("failed: {0}")]
    Failed(#[from] Error),
}

/// One ranked composition strategy
pub trait CompositionTier {
    /// Tier identifier used in logs and reports
    fn name(&self) -> &'static str;

    /// Check if the tier can run at all
    fn is_available(&self) -> bool {
        true
    }

    /// Write the composed output for `inputs` to `output`
    fn compose(&self, inputs: &[ClipInput], output: &Path) -> std::result::Result<(), TierError>;
}

/// Outcome of one tier attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TierOutcome {
    Succeeded,
    Unavailable(String),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TierAttempt {
    pub tier: &'static str,
    pub outcome: TierOutcome,
}

/// Record of every tier tried during one composition
#[derive(Debug, Clone, Default)]
pub struct ChainReport {
    pub attempts: Vec<TierAttempt>,
}

impl ChainReport {
    /// Name of the tier that produced the output
    pub fn winner(&self) -> Option<&'static str> {
        self.attempts
            .iter()
            .find(|a| a.outcome == TierOutcome::Succeeded)
            .map(|a| a.tier)
    }

    /// Whether anything other than the first tier produced the output
    pub fn degraded(&self) -> bool {
        self.attempts.len() > 1
    }

    fn summary(&self) -> String {
        self.attempts
            .iter()
            .map(|a| match &a.outcome {
                TierOutcome::Succeeded => format!("{}: ok", a.tier),
                TierOutcome::Unavailable(m) => format!("{}: unavailable ({})", a.tier, m),
                TierOutcome::Failed(m) => format!("{}: {}", a.tier, m),
            })
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Ordered list of composition tiers
pub struct FallbackChain {
    tiers: Vec<Box<dyn CompositionTier>>,
}

impl FallbackChain {
    /// Standard four-tier chain
    pub fn from_config(config: &CompositionConfig) -> Self {
        Self::with_tiers(vec![
            Box::new(AdaptiveTier::new(config.clone())),
            Box::new(ProbabilisticTier::new(
                config.fallback.clone(),
                config.mp3_bitrate_kbps,
            )),
            Box::new(ExternalConcatTier::new(config.concat_tool.clone())),
            Box::new(CopyFirstTier),
        ])
    }

    pub fn with_tiers(tiers: Vec<Box<dyn CompositionTier>>) -> Self {
        Self { tiers }
    }

    pub fn tier_names(&self) -> Vec<&'static str> {
        self.tiers.iter().map(|t| t.name()).collect()
    }

    /// Try each tier in order until one writes a non-empty `output`
    ///
    /// # Errors
    /// - `Composition` when there are no inputs
    /// - `OutputWrite` when every tier failed
    pub fn compose(&self, inputs: &[ClipInput], output: &Path) -> Result<ChainReport> {
        if inputs.is_empty() {
            return Err(Error::Composition("no clips to compose".to_string()));
        }

        let mut report = ChainReport::default();
        for tier in &self.tiers {
            let name = tier.name();
            if !tier.is_available() {
                debug!(tier = name, "Composition tier unavailable");
                report.attempts.push(TierAttempt {
                    tier: name,
                    outcome: TierOutcome::Unavailable("not available".to_string()),
                });
                continue;
            }

            let outcome = match tier.compose(inputs, output).and_then(|()| check_output(output)) {
                Ok(()) => TierOutcome::Succeeded,
                Err(TierError::Unavailable(message)) => {
                    debug!(tier = name, %message, "Composition tier unavailable");
                    TierOutcome::Unavailable(message)
                }
                Err(TierError::Failed(e)) => {
                    warn!(tier = name, error = %e, "Composition tier failed, trying next");
                    TierOutcome::Failed(e.to_string())
                }
            };

            let succeeded = outcome == TierOutcome::Succeeded;
            report.attempts.push(TierAttempt { tier: name, outcome });
            if succeeded {
                info!(
                    tier = name,
                    clips = inputs.len(),
                    output = %output.display(),
                    "Composition complete"
                );
                return Ok(report);
            }
        }

        Err(Error::OutputWrite {
            path: output.to_path_buf(),
            message: format!("every composition tier failed ({})", report.summary()),
        })
    }
}

/// A tier only counts as successful if it left a non-empty file behind
fn check_output(output: &Path) -> std::result::Result<(), TierError> {
    let len = std::fs::metadata(output).map_err(Error::from)?.len();
    if len == 0 {
        return Err(Error::Composition(format!("{} is empty", output.display())).into());
    }
    Ok(())
}

fn decode_all(inputs: &[ClipInput]) -> Result<Vec<AudioClip>> {
    inputs
        .iter()
        .map(|input| ClipDecoder::decode_file(&input.path))
        .collect()
}

/// Tier 1: trim, normalize and join by timing tag
pub struct AdaptiveTier {
    config: CompositionConfig,
}

impl AdaptiveTier {
    pub fn new(config: CompositionConfig) -> Self {
        Self { config }
    }
}

impl CompositionTier for AdaptiveTier {
    fn name(&self) -> &'static str {
        "adaptive"
    }

    fn is_available(&self) -> bool {
        self.config.adaptive
    }

    fn compose(&self, inputs: &[ClipInput], output: &Path) -> std::result::Result<(), TierError> {
        let mut sequencer = Sequencer::new(&self.config);
        for input in inputs {
            let clip = ClipDecoder::decode_file(&input.path)?;
            sequencer.push(clip, input.timing)?;
        }
        sequencer.finalize(output, self.config.mp3_bitrate_kbps)?;
        Ok(())
    }
}

/// Tier 2: untreated clips joined with a fixed gap, sometimes overlapped at random
pub struct ProbabilisticTier {
    config: SimpleJoinConfig,
    bitrate_kbps: u32,
}

impl ProbabilisticTier {
    pub fn new(config: SimpleJoinConfig, bitrate_kbps: u32) -> Self {
        Self {
            config,
            bitrate_kbps,
        }
    }

    /// Join decoded clips with `rng` deciding where to overlap
    pub fn join<R: Rng>(&self, clips: Vec<AudioClip>, rng: &mut R) -> Result<AudioClip> {
        let mut clips = clips.into_iter();
        let mut composite = clips
            .next()
            .ok_or_else(|| Error::Composition("no clips to compose".to_string()))?;
        let gap = AudioClip::silent(self.config.gap_ms, composite.sample_rate);

        for (index, clip) in clips.enumerate() {
            if clip.sample_rate != composite.sample_rate {
                return Err(Error::Composition(format!(
                    "clip {} is {}Hz, composite is {}Hz",
                    index + 1,
                    clip.sample_rate,
                    composite.sample_rate
                )));
            }

            let composite_ms = composite.duration_ms();
            let clip_ms = clip.duration_ms();
            let roll: f64 = rng.gen();

            if roll < self.config.overlap_probability
                && composite_ms > self.config.min_composite_ms
                && clip_ms > self.config.min_clip_ms
            {
                let window_ms = self
                    .config
                    .overlap_cap_ms
                    .min(clip_ms / 2)
                    .min(composite_ms / 2);
                let offset = composite.frames() - composite.ms_to_frames(window_ms);
                composite.overlay_at(&clip, offset);
                debug!(index = index + 1, window_ms, "Overlapped clip");
            } else {
                composite.append(&gap);
                composite.append(&clip);
            }
        }
        Ok(composite)
    }
}

impl CompositionTier for ProbabilisticTier {
    fn name(&self) -> &'static str {
        "probabilistic"
    }

    fn compose(&self, inputs: &[ClipInput], output: &Path) -> std::result::Result<(), TierError> {
        let clips = decode_all(inputs)?;
        let mut rng = match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let composite = self.join(clips, &mut rng)?;
        encode_to_file(&composite, output, self.bitrate_kbps)?;
        Ok(())
    }
}

/// Tier 3: stream-copy concatenation with an external tool (ffmpeg concat demuxer)
pub struct ExternalConcatTier {
    tool: String,
}

impl ExternalConcatTier {
    pub fn new(tool: impl Into<String>) -> Self {
        Self { tool: tool.into() }
    }

    /// Concat list file written next to the output
    fn list_path(output: &Path) -> PathBuf {
        let mut name = output
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".concat.txt");
        output.with_file_name(name)
    }

    /// One `file '<path>'` line per clip, absolute paths, quotes escaped
    pub fn concat_list(inputs: &[ClipInput]) -> Result<String> {
        let mut list = String::new();
        for input in inputs {
            let path = if input.path.is_absolute() {
                input.path.clone()
            } else {
                std::env::current_dir()?.join(&input.path)
            };
            let escaped = path.to_string_lossy().replace('\'', r"'\''");
            list.push_str(&format!("file '{}'\n", escaped));
        }
        Ok(list)
    }

    fn run(&self, list: &Path, output: &Path) -> std::result::Result<(), TierError> {
        let result = Command::new(&self.tool)
            .args(["-f", "concat", "-safe", "0", "-i"])
            .arg(list)
            .args(["-c", "copy"])
            .arg(output)
            .arg("-y")
            .output()
            .map_err(|e| TierError::Unavailable(format!("{} could not be started: {}", self.tool, e)))?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            let last_line = stderr.lines().last().unwrap_or("").trim();
            return Err(Error::Composition(format!(
                "{} exited with {}: {}",
                self.tool, result.status, last_line
            ))
            .into());
        }
        Ok(())
    }
}

impl CompositionTier for ExternalConcatTier {
    fn name(&self) -> &'static str {
        "external-concat"
    }

    fn is_available(&self) -> bool {
        Command::new(&self.tool)
            .arg("-version")
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    fn compose(&self, inputs: &[ClipInput], output: &Path) -> std::result::Result<(), TierError> {
        let list = Self::list_path(output);
        std::fs::write(&list, Self::concat_list(inputs)?).map_err(Error::from)?;

        let result = self.run(&list, output);
        if let Err(e) = std::fs::remove_file(&list) {
            warn!("Failed to remove concat list {}: {}", list.display(), e);
        }
        result
    }
}

/// Tier 4: copy the first clip to the output path
pub struct CopyFirstTier;

impl CompositionTier for CopyFirstTier {
    fn name(&self) -> &'static str {
        "copy-first"
    }

    fn compose(&self, inputs: &[ClipInput], output: &Path) -> std::result::Result<(), TierError> {
        let first = inputs
            .first()
            .ok_or_else(|| Error::Composition("no clips to compose".to_string()))?;
        std::fs::copy(&first.path, output).map_err(Error::from)?;
        warn!(
            clip = %first.path.display(),
            "Output contains only the first segment"
        );
        Ok(())
    }
}
