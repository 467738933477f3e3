//! Loudness measurement and normalization

use super::types::AudioClip;
use duet_common::timing::{db_to_linear, linear_to_db};

/// RMS loudness in dBFS, or `None` for an empty or digitally silent clip
pub fn dbfs(clip: &AudioClip) -> Option<f32> {
    let rms = clip.rms();
    if rms > 0.0 {
        Some(linear_to_db(rms))
    } else {
        None
    }
}

/// Apply uniform gain so the clip's RMS loudness lands on `target_dbfs`
///
/// Unmeasurable clips are left untouched. Peaks that would exceed full scale
/// are clamped.
pub fn normalize(clip: &mut AudioClip, target_dbfs: f32) {
    if let Some(current) = dbfs(clip) {
        clip.apply_gain(db_to_linear(target_dbfs - current));
    }
}
