//! Millisecond/frame conversions and decibel helpers
//!
//! Audio editing in duet is specified in milliseconds (pauses, windows,
//! paddings) while buffers are indexed by PCM frames. A frame holds one
//! sample per channel.
//!
//! ```rust
//! use duet_common::timing::*;
//!
//! assert_eq!(ms_to_frames(1000, 44100), 44100);
//! assert_eq!(frames_to_ms(22050, 44100), 500);
//! assert!((db_to_linear(-20.0) - 0.1).abs() < 1e-6);
//! ```

/// Number of frames covering `ms` milliseconds at `sample_rate` (truncating)
pub fn ms_to_frames(ms: u64, sample_rate: u32) -> usize {
    assert!(sample_rate > 0, "sample_rate must be > 0");
    ((ms * sample_rate as u64) / 1000) as usize
}

/// Duration of `frames` frames in milliseconds (truncating)
pub fn frames_to_ms(frames: usize, sample_rate: u32) -> u64 {
    assert!(sample_rate > 0, "sample_rate must be > 0");
    (frames as u64 * 1000) / sample_rate as u64
}

/// Convert dB (relative to full scale) to a linear amplitude factor
pub fn db_to_linear(db: f32) -> f32 {
    10.0_f32.powf(db / 20.0)
}

/// Convert a linear amplitude to dB; zero maps to negative infinity
pub fn linear_to_db(linear: f32) -> f32 {
    20.0 * linear.log10()
}
