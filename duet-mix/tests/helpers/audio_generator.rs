//! Audio Test Fixture Generator
//!
//! Writes 16-bit WAV clips standing in for synthesized speech: a tone,
//! optionally surrounded by silence.

use std::path::{Path, PathBuf};

/// Configuration for a generated clip
#[derive(Debug, Clone)]
pub struct ToneConfig {
    pub lead_silence_ms: u64,
    pub tone_ms: u64,
    pub trail_silence_ms: u64,
    pub sample_rate: u32,
    pub channels: u16,
    pub frequency: f32,
    pub amplitude: f32,
}

impl Default for ToneConfig {
    fn default() -> Self {
        Self {
            lead_silence_ms: 0,
            tone_ms: 1000,
            trail_silence_ms: 0,
            sample_rate: 44100,
            channels: 2,
            frequency: 220.0,
            amplitude: 0.3,
        }
    }
}

fn frames(ms: u64, sample_rate: u32) -> usize {
    (ms * sample_rate as u64 / 1000) as usize
}

/// Generate a WAV file from `config`
pub fn generate_wav(path: &Path, config: &ToneConfig) -> anyhow::Result<PathBuf> {
    let spec = hound::WavSpec {
        channels: config.channels,
        sample_rate: config.sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = hound::WavWriter::create(path, spec)?;
    let lead = frames(config.lead_silence_ms, config.sample_rate);
    let tone = frames(config.tone_ms, config.sample_rate);
    let trail = frames(config.trail_silence_ms, config.sample_rate);

    for i in 0..(lead + tone + trail) {
        let sample = if i >= lead && i < lead + tone {
            let t = (i - lead) as f32 / config.sample_rate as f32;
            (config.amplitude * (2.0 * std::f32::consts::PI * config.frequency * t).sin()
                * i16::MAX as f32) as i16
        } else {
            0
        };
        for _ in 0..config.channels {
            writer.write_sample(sample)?;
        }
    }

    writer.finalize()?;
    Ok(path.to_path_buf())
}

/// Stereo 44.1kHz tone with no surrounding silence
pub fn generate_tone_wav(path: &Path, tone_ms: u64) -> anyhow::Result<PathBuf> {
    generate_wav(
        path,
        &ToneConfig {
            tone_ms,
            ..ToneConfig::default()
        },
    )
}

/// Stereo 44.1kHz tone with leading and trailing silence
pub fn generate_padded_tone_wav(
    path: &Path,
    lead_ms: u64,
    tone_ms: u64,
    trail_ms: u64,
) -> anyhow::Result<PathBuf> {
    generate_wav(
        path,
        &ToneConfig {
            lead_silence_ms: lead_ms,
            tone_ms,
            trail_silence_ms: trail_ms,
            ..ToneConfig::default()
        },
    )
}

/// Duration of a WAV file in milliseconds
pub fn wav_duration_ms(path: &Path) -> anyhow::Result<u64> {
    let reader = hound::WavReader::open(path)?;
    let spec = reader.spec();
    let frames = reader.duration() as u64;
    Ok(frames * 1000 / spec.sample_rate as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_generate_padded_wav() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("clip.wav");
        generate_padded_tone_wav(&path, 200, 1000, 300).unwrap();
        assert_eq!(wav_duration_ms(&path).unwrap(), 1500);
    }
}
