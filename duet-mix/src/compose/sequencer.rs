//! Adaptive sequencer
//!
//! State machine `Empty → Composed → Finalized`. The first clip is gently
//! trimmed and normalized into the composite. Every later clip is trimmed
//! (gentle within the opening window, standard after), normalized, and
//! joined according to its timing tag after the composite's tail silence
//! has been trimmed.

use crate::audio::loudness::normalize;
use crate::audio::silence::{trim, trim_tail, TrimProfile};
use crate::audio::{encode_to_file, AudioClip};
use crate::config::CompositionConfig;
use crate::error::{Error, Result};
use crate::script::TimingTag;
use duet_common::FadeCurve;
use std::path::Path;
use tracing::debug;

/// Running composite plus processing context
#[derive(Debug, Clone)]
pub struct Composite {
    pub audio: AudioClip,

    /// Clips joined so far
    pub clips_joined: usize,
}

#[derive(Debug, Clone)]
pub enum CompositionState {
    Empty,
    Composed(Composite),
    Finalized { duration_ms: u64 },
}

/// Joins clips in script order into one buffer
pub struct Sequencer<'a> {
    config: &'a CompositionConfig,
    state: CompositionState,
}

impl<'a> Sequencer<'a> {
    pub fn new(config: &'a CompositionConfig) -> Self {
        Self {
            config,
            state: CompositionState::Empty,
        }
    }

    pub fn state(&self) -> &CompositionState {
        &self.state
    }

    /// Current composite, if any clip has been pushed
    pub fn composite(&self) -> Option<&AudioClip> {
        match &self.state {
            CompositionState::Composed(c) => Some(&c.audio),
            _ => None,
        }
    }

    /// Trim profile for the clip at `index`
    fn profile_for(&self, index: usize) -> &TrimProfile {
        if index <= self.config.gentle_window {
            &self.config.gentle
        } else {
            &self.config.standard
        }
    }

    fn prepare(&self, clip: AudioClip, profile: &TrimProfile) -> AudioClip {
        let mut clip = trim(clip, profile);
        normalize(&mut clip, self.config.target_dbfs);
        clip
    }

    /// Join the next clip; the first clip's timing tag is ignored
    pub fn push(&mut self, clip: AudioClip, timing: TimingTag) -> Result<()> {
        match std::mem::replace(&mut self.state, CompositionState::Empty) {
            CompositionState::Empty => {
                let audio = self.prepare(clip, &self.config.gentle);
                debug!(duration_ms = audio.duration_ms(), "Composite started");
                self.state = CompositionState::Composed(Composite {
                    audio,
                    clips_joined: 1,
                });
                Ok(())
            }
            CompositionState::Composed(mut composite) => {
                if clip.sample_rate != composite.audio.sample_rate {
                    let message = format!(
                        "clip {} is {}Hz, composite is {}Hz",
                        composite.clips_joined, clip.sample_rate, composite.audio.sample_rate
                    );
                    self.state = CompositionState::Composed(composite);
                    return Err(Error::Composition(message));
                }

                let index = composite.clips_joined;
                let clip = self.prepare(clip, self.profile_for(index));
                let clip_ms = clip.duration_ms();

                trim_tail(&mut composite.audio, &self.config.standard);

                match timing {
                    TimingTag::Normal => {
                        join_normal(
                            &mut composite.audio,
                            &clip,
                            self.config.pause_ms,
                            self.config.crossfade_ms,
                            self.config.fade_curve,
                        );
                        debug!(index, clip_ms, timing = "normal", "Joined clip");
                    }
                    TimingTag::Overlap => {
                        let window_ms = join_overlap(&mut composite.audio, &clip, self.config);
                        debug!(index, clip_ms, window_ms, timing = "overlap", "Joined clip");
                    }
                    TimingTag::Simultaneous => {
                        let backup_ms = join_simultaneous(
                            &mut composite.audio,
                            &clip,
                            self.config.simultaneous_cap_ms,
                        );
                        debug!(index, clip_ms, backup_ms, timing = "simultaneous", "Joined clip");
                    }
                }

                composite.clips_joined += 1;
                self.state = CompositionState::Composed(composite);
                Ok(())
            }
            CompositionState::Finalized { duration_ms } => {
                self.state = CompositionState::Finalized { duration_ms };
                Err(Error::Composition(
                    "cannot join a clip after finalizing".to_string(),
                ))
            }
        }
    }

    /// Encode the composite to `output`; returns its duration in ms
    pub fn finalize(&mut self, output: &Path, bitrate_kbps: u32) -> Result<u64> {
        let composite = match &self.state {
            CompositionState::Composed(c) => c,
            CompositionState::Empty => {
                return Err(Error::Composition("no clips to compose".to_string()))
            }
            CompositionState::Finalized { .. } => {
                return Err(Error::Composition("already finalized".to_string()))
            }
        };

        encode_to_file(&composite.audio, output, bitrate_kbps)?;
        let duration_ms = composite.audio.duration_ms();
        debug!(
            clips = composite.clips_joined,
            duration_ms,
            "Composite finalized"
        );
        self.state = CompositionState::Finalized { duration_ms };
        Ok(duration_ms)
    }
}

/// Pause, then crossfade the clip's head over the last window of (composite + pause)
///
/// Falls back to plain concatenation when either side is shorter than the window.
pub fn join_normal(
    composite: &mut AudioClip,
    clip: &AudioClip,
    pause_ms: u64,
    crossfade_ms: u64,
    curve: FadeCurve,
) {
    composite.append(&AudioClip::silent(pause_ms, composite.sample_rate));

    let window = composite.ms_to_frames(crossfade_ms);
    if window == 0 || composite.frames() < window || clip.frames() < window {
        composite.append(clip);
        return;
    }

    composite.fade_out(window, curve);
    let mut head = clip.slice_frames(0, window);
    head.fade_in(window, curve);

    let offset = composite.frames() - window;
    composite.overlay_at(&head, offset);
    composite.append(&clip.slice_frames(window, clip.frames()));
}

/// Overlay the clip's head onto the composite's tail
///
/// Window is `min(cap, clip / divisor, composite / 2)`; at or below the
/// minimum the clip is appended directly with no pause. Returns the window
/// applied (0 when appended).
pub fn join_overlap(composite: &mut AudioClip, clip: &AudioClip, config: &CompositionConfig) -> u64 {
    let clip_ms = clip.duration_ms();
    let composite_ms = composite.duration_ms();

    let by_clip = (clip_ms as f64 / config.overlap_clip_divisor as f64).floor() as u64;
    let window_ms = config.overlap_cap_ms.min(by_clip).min(composite_ms / 2);

    if window_ms > config.overlap_min_ms {
        let offset = composite.frames() - composite.ms_to_frames(window_ms);
        composite.overlay_at(clip, offset);
        window_ms
    } else {
        composite.append(clip);
        0
    }
}

/// Overlay the whole clip starting `backup` before the composite's end
///
/// `backup = min(cap, composite / 3, clip)`. The track extends by
/// `clip - backup`. When backup collapses to zero the clip is aligned to end
/// with the composite, extending it if longer. Returns the backup applied.
pub fn join_simultaneous(composite: &mut AudioClip, clip: &AudioClip, cap_ms: u64) -> u64 {
    let backup_ms = cap_ms
        .min(composite.duration_ms() / 3)
        .min(clip.duration_ms());

    let offset = if backup_ms > 0 {
        composite.frames() - composite.ms_to_frames(backup_ms)
    } else {
        composite.frames().saturating_sub(clip.frames())
    };
    composite.overlay_at(clip, offset);
    backup_ms
}
