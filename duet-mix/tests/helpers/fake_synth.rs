//! Offline speech provider for pipeline tests
//!
//! Writes a genuine MP3 tone per request (duration grows with text length)
//! and can be told to fail on a given call.

use async_trait::async_trait;
use duet_mix::audio::encoder::encode_mp3;
use duet_mix::audio::AudioClip;
use duet_mix::script::SpeakerId;
use duet_mix::synth::{SpeechSynthesizer, SynthError};
use std::path::Path;
use std::sync::Mutex;

const RATE: u32 = 44100;

pub struct FakeSynthesizer {
    fail_on_call: Option<usize>,
    calls: Mutex<Vec<(String, SpeakerId)>>,
}

impl FakeSynthesizer {
    pub fn new() -> Self {
        Self {
            fail_on_call: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Fail the `index`-th request (0-based)
    pub fn failing_at(index: usize) -> Self {
        Self {
            fail_on_call: Some(index),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<(String, SpeakerId)> {
        self.calls.lock().unwrap().clone()
    }
}

/// Silence, tone, silence
pub fn speech_like_clip(tone_ms: u64, frequency: f32) -> AudioClip {
    let mut clip = AudioClip::silent(150, RATE);
    let frames = (tone_ms * RATE as u64 / 1000) as usize;
    let samples = (0..frames)
        .flat_map(|i| {
            let s = (2.0 * std::f32::consts::PI * frequency * i as f32 / RATE as f32).sin() * 0.3;
            [s, s]
        })
        .collect();
    clip.append(&AudioClip::new(samples, RATE));
    clip.append(&AudioClip::silent(250, RATE));
    clip
}

#[async_trait]
impl SpeechSynthesizer for FakeSynthesizer {
    fn provider_name(&self) -> &'static str {
        "fake"
    }

    async fn synthesize(&self, text: &str, speaker: SpeakerId, dest: &Path) -> Result<(), SynthError> {
        let call = {
            let mut calls = self.calls.lock().unwrap();
            calls.push((text.to_string(), speaker));
            calls.len() - 1
        };

        if self.fail_on_call == Some(call) {
            // Leave a partial file behind like an interrupted download would
            std::fs::write(dest, b"partial")?;
            return Err(SynthError::Api(503, "provider unavailable".to_string()));
        }

        let frequency = match speaker {
            SpeakerId::A => 220.0,
            SpeakerId::B => 330.0,
        };
        let clip = speech_like_clip((text.len() as u64 * 60).max(600), frequency);
        let bytes = encode_mp3(&clip, 128).map_err(|e| SynthError::Parse(e.to_string()))?;
        std::fs::write(dest, bytes)?;
        Ok(())
    }
}
