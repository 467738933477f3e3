//! Core audio data types

use duet_common::timing::{frames_to_ms, ms_to_frames};
use duet_common::FadeCurve;

/// Number of interleaved channels in every clip
pub const CHANNELS: usize = 2;

/// AudioClip holds one decoded, resampled piece of audio.
///
/// **Format:**
/// - Samples are f32 (floating point -1.0 to 1.0)
/// - Stereo interleaved: [L, R, L, R, ...]
/// - Sample rate is the working rate after decoding
///
/// Clips are moved between stages, never shared mutably.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioClip {
    /// PCM audio samples (interleaved stereo)
    pub samples: Vec<f32>,

    pub sample_rate: u32,
}

impl AudioClip {
    /// Wrap interleaved stereo samples
    ///
    /// # Panics
    /// Panics if `samples` is not made of whole stereo frames or the rate is zero
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        assert_eq!(samples.len() % CHANNELS, 0, "Samples must be stereo pairs");
        assert!(sample_rate > 0, "sample_rate must be > 0");
        Self {
            samples,
            sample_rate,
        }
    }

    /// Digital silence of the given duration
    pub fn silent(ms: u64, sample_rate: u32) -> Self {
        let frames = ms_to_frames(ms, sample_rate);
        Self::new(vec![0.0; frames * CHANNELS], sample_rate)
    }

    /// Number of stereo frames
    pub fn frames(&self) -> usize {
        self.samples.len() / CHANNELS
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Get duration in milliseconds
    pub fn duration_ms(&self) -> u64 {
        frames_to_ms(self.frames(), self.sample_rate)
    }

    pub fn ms_to_frames(&self, ms: u64) -> usize {
        ms_to_frames(ms, self.sample_rate)
    }

    /// Copy of frames `[start, end)`, clamped to the clip bounds
    pub fn slice_frames(&self, start: usize, end: usize) -> AudioClip {
        let end = end.min(self.frames());
        let start = start.min(end);
        AudioClip::new(
            self.samples[start * CHANNELS..end * CHANNELS].to_vec(),
            self.sample_rate,
        )
    }

    /// Copy of `[start_ms, end_ms)`, clamped to the clip bounds
    pub fn slice_ms(&self, start_ms: u64, end_ms: u64) -> AudioClip {
        self.slice_frames(self.ms_to_frames(start_ms), self.ms_to_frames(end_ms))
    }

    /// Append another clip at the end
    ///
    /// # Panics
    /// Panics if the sample rates differ
    pub fn append(&mut self, other: &AudioClip) {
        assert_eq!(self.sample_rate, other.sample_rate, "Sample rate mismatch");
        self.samples.extend_from_slice(&other.samples);
    }

    /// Mix `other` into this clip starting at `frame_offset`
    ///
    /// Samples are summed and clamped to [-1.0, 1.0]. If `other` runs past the
    /// end (or starts after it) the clip is extended.
    ///
    /// # Panics
    /// Panics if the sample rates differ
    pub fn overlay_at(&mut self, other: &AudioClip, frame_offset: usize) {
        assert_eq!(self.sample_rate, other.sample_rate, "Sample rate mismatch");

        let required = (frame_offset + other.frames()) * CHANNELS;
        if self.samples.len() < required {
            self.samples.resize(required, 0.0);
        }

        let start = frame_offset * CHANNELS;
        for (dst, src) in self.samples[start..required].iter_mut().zip(&other.samples) {
            *dst = (*dst + *src).clamp(-1.0, 1.0);
        }
    }

    /// Multiply every sample by `gain`, clamping to [-1.0, 1.0]
    pub fn apply_gain(&mut self, gain: f32) {
        for sample in &mut self.samples {
            *sample = (*sample * gain).clamp(-1.0, 1.0);
        }
    }

    /// Fade in the first `frames` frames
    pub fn fade_in(&mut self, frames: usize, curve: FadeCurve) {
        let frames = frames.min(self.frames());
        if frames == 0 {
            return;
        }
        for i in 0..frames {
            let gain = curve.calculate_fade_in(i as f32 / frames as f32);
            for ch in 0..CHANNELS {
                self.samples[i * CHANNELS + ch] *= gain;
            }
        }
    }

    /// Fade out the last `frames` frames
    pub fn fade_out(&mut self, frames: usize, curve: FadeCurve) {
        let total = self.frames();
        let frames = frames.min(total);
        if frames == 0 {
            return;
        }
        let start = total - frames;
        for i in 0..frames {
            let gain = curve.calculate_fade_out((i + 1) as f32 / frames as f32);
            for ch in 0..CHANNELS {
                self.samples[(start + i) * CHANNELS + ch] *= gain;
            }
        }
    }

    /// Root-mean-square level over all samples (0.0 for an empty clip)
    pub fn rms(&self) -> f32 {
        rms(&self.samples)
    }
}

/// Root-mean-square of a sample slice
pub(crate) fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum: f64 = samples.iter().map(|&s| (s as f64) * (s as f64)).sum();
    (sum / samples.len() as f64).sqrt() as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn constant(value: f32, frames: usize) -> AudioClip {
        AudioClip::new(vec![value; frames * CHANNELS], 1000)
    }

    #[test]
    fn test_duration_and_slicing() {
        let clip = AudioClip::silent(2500, 44100);
        assert_eq!(clip.duration_ms(), 2500);
        assert_eq!(clip.slice_ms(500, 1500).duration_ms(), 1000);
        // Clamped past the end
        assert_eq!(clip.slice_ms(2000, 9000).duration_ms(), 500);
        assert!(clip.slice_ms(3000, 4000).is_empty());
    }

    #[test]
    fn test_overlay_clamps_and_extends() {
        let mut base = constant(0.8, 4);
        base.overlay_at(&constant(0.5, 4), 2);

        assert_eq!(base.frames(), 6);
        assert_eq!(base.samples[0], 0.8);
        assert_eq!(base.samples[4], 1.0); // 0.8 + 0.5 clamped
        assert_eq!(base.samples[10], 0.5); // extension region
    }

    #[test]
    fn test_overlay_past_end_pads_with_silence() {
        let mut base = constant(0.1, 2);
        base.overlay_at(&constant(0.2, 1), 4);
        assert_eq!(base.frames(), 5);
        assert_eq!(base.samples[4..8], [0.0; 4]);
    }

    #[test]
    fn test_linear_fades_reach_endpoints() {
        let mut clip = constant(1.0, 10);
        clip.fade_in(4, FadeCurve::Linear);
        assert_eq!(clip.samples[0], 0.0);
        assert_eq!(clip.samples[8], 1.0);

        let mut clip = constant(1.0, 10);
        clip.fade_out(4, FadeCurve::Linear);
        assert_eq!(clip.samples[19], 0.0);
        assert_eq!(clip.samples[11], 1.0);
    }

    #[test]
    fn test_rms() {
        assert_eq!(AudioClip::new(vec![], 44100).rms(), 0.0);
        assert!((constant(0.5, 8).rms() - 0.5).abs() < 1e-6);
    }

    #[test]
    #[should_panic(expected = "Samples must be stereo pairs")]
    fn test_odd_sample_count_rejected() {
        AudioClip::new(vec![0.0; 3], 44100);
    }
}
