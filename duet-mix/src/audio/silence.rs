//! Silence detection and trimming
//!
//! Sliding-window RMS at 1ms resolution. A window of `min_silence_ms`
//! starting at every millisecond is silent when its RMS is at or below the
//! threshold (dBFS, full scale 1.0). Overlapping or touching silent windows
//! merge into one range `[first_start, last_start + min_silence_ms)`.

use super::types::{AudioClip, CHANNELS};
use duet_common::timing::{db_to_linear, ms_to_frames};
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Only this much of a long composite is analyzed when trimming its tail,
/// unless that stretch turns out to be entirely silent
const TAIL_SCAN_MS: u64 = 10_000;

/// Silence trimming sensitivity
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrimProfile {
    /// Shortest stretch that counts as silence
    pub min_silence_ms: u64,

    /// Windows at or below this RMS level (dBFS) are silent
    pub threshold_db: f32,

    /// Audio kept before the first non-silent region
    pub head_padding_ms: u64,

    /// Audio kept after the last non-silent region
    pub tail_padding_ms: u64,
}

impl TrimProfile {
    /// Conservative profile for the opening clips: less audio counts as
    /// silence and speech endings keep generous padding
    pub fn gentle() -> Self {
        Self {
            min_silence_ms: 300,
            threshold_db: -50.0,
            head_padding_ms: 150,
            tail_padding_ms: 300,
        }
    }

    pub fn standard() -> Self {
        Self {
            min_silence_ms: 200,
            threshold_db: -40.0,
            head_padding_ms: 100,
            tail_padding_ms: 200,
        }
    }
}

impl Default for TrimProfile {
    fn default() -> Self {
        Self::standard()
    }
}

/// Sum of squared samples over the first `k` milliseconds, for k in 0..=len_ms
fn energy_prefix(clip: &AudioClip, len_ms: u64) -> Vec<f64> {
    let mut prefix = Vec::with_capacity(len_ms as usize + 1);
    let mut acc = 0.0_f64;
    prefix.push(acc);
    for k in 0..len_ms {
        let a = ms_to_frames(k, clip.sample_rate) * CHANNELS;
        let b = ms_to_frames(k + 1, clip.sample_rate) * CHANNELS;
        acc += clip.samples[a..b]
            .iter()
            .map(|&s| (s as f64) * (s as f64))
            .sum::<f64>();
        prefix.push(acc);
    }
    prefix
}

/// Silent ranges in milliseconds
///
/// A clip shorter than `min_silence_ms` has no silent ranges.
pub fn detect_silence(clip: &AudioClip, min_silence_ms: u64, threshold_db: f32) -> Vec<Range<u64>> {
    let len = clip.duration_ms();
    if min_silence_ms == 0 || len < min_silence_ms {
        return Vec::new();
    }

    let threshold = db_to_linear(threshold_db) as f64;
    let prefix = energy_prefix(clip, len);

    let mut ranges: Vec<Range<u64>> = Vec::new();
    for start in 0..=(len - min_silence_ms) {
        let end = start + min_silence_ms;
        let count = (ms_to_frames(end, clip.sample_rate) - ms_to_frames(start, clip.sample_rate))
            * CHANNELS;
        let rms = if count == 0 {
            0.0
        } else {
            ((prefix[end as usize] - prefix[start as usize]).max(0.0) / count as f64).sqrt()
        };

        if rms <= threshold {
            match ranges.last_mut() {
                Some(range) if start <= range.end => range.end = end,
                _ => ranges.push(start..end),
            }
        }
    }
    ranges
}

/// Non-silent ranges in milliseconds (complement of [`detect_silence`])
///
/// An entirely silent clip yields no ranges; a clip without silence yields
/// one range covering all of it.
pub fn detect_nonsilent(clip: &AudioClip, min_silence_ms: u64, threshold_db: f32) -> Vec<Range<u64>> {
    let len = clip.duration_ms();
    let silent = detect_silence(clip, min_silence_ms, threshold_db);

    if silent.is_empty() {
        return vec![0..len];
    }
    if silent[0] == (0..len) {
        return Vec::new();
    }

    let mut nonsilent = Vec::with_capacity(silent.len() + 1);
    let mut prev_end = 0;
    for range in &silent {
        if range.start > prev_end {
            nonsilent.push(prev_end..range.start);
        }
        prev_end = range.end;
    }
    if prev_end < len {
        nonsilent.push(prev_end..len);
    }
    nonsilent
}

/// End frame for a trim ending at `end_ms`; the clip's own end keeps sub-ms frames
fn end_frame(clip: &AudioClip, end_ms: u64) -> usize {
    if end_ms >= clip.duration_ms() {
        clip.frames()
    } else {
        clip.ms_to_frames(end_ms)
    }
}

/// Remove leading and trailing silence, keeping the profile's padding
///
/// An entirely silent clip is returned unchanged. Never lengthens a clip.
pub fn trim(clip: AudioClip, profile: &TrimProfile) -> AudioClip {
    let nonsilent = detect_nonsilent(&clip, profile.min_silence_ms, profile.threshold_db);
    let (first, last) = match (nonsilent.first(), nonsilent.last()) {
        (Some(first), Some(last)) => (first.start, last.end),
        _ => return clip,
    };

    let start_ms = first.saturating_sub(profile.head_padding_ms);
    let end_ms = last.saturating_add(profile.tail_padding_ms);

    let start = clip.ms_to_frames(start_ms);
    let end = end_frame(&clip, end_ms);
    if start == 0 && end == clip.frames() {
        return clip;
    }
    clip.slice_frames(start, end)
}

/// Remove trailing silence only, keeping the profile's tail padding
///
/// Used on the running composite, where the head has already been placed.
pub fn trim_tail(clip: &mut AudioClip, profile: &TrimProfile) {
    let len = clip.duration_ms();

    // Whole seconds keep ms→frame boundaries identical to the full clip
    let offset_ms = (len.saturating_sub(TAIL_SCAN_MS) / 1000) * 1000;
    let mut last_end = None;
    if offset_ms > 0 {
        let suffix = clip.slice_frames(clip.ms_to_frames(offset_ms), clip.frames());
        last_end = detect_nonsilent(&suffix, profile.min_silence_ms, profile.threshold_db)
            .last()
            .map(|r| offset_ms + r.end);
    }
    if last_end.is_none() {
        last_end = detect_nonsilent(clip, profile.min_silence_ms, profile.threshold_db)
            .last()
            .map(|r| r.end);
    }

    if let Some(last_end) = last_end {
        let end = end_frame(clip, last_end.saturating_add(profile.tail_padding_ms));
        clip.samples.truncate(end * CHANNELS);
    }
}
