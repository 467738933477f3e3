//! Test Helper Utilities
//!
//! Shared utilities for testing duet-mix

#![allow(dead_code, unused_imports)]

pub mod audio_generator;
pub mod fake_synth;
pub mod mock_tts;

// Re-export commonly used items
pub use audio_generator::{generate_padded_tone_wav, generate_tone_wav, wav_duration_ms, ToneConfig};
pub use fake_synth::{speech_like_clip, FakeSynthesizer};
pub use mock_tts::{bind_mock_server, serve_mock};
