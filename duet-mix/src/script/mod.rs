//! Dialogue script model
//!
//! A script is parsed once into an ordered list of [`Segment`]s. Each segment
//! is synthesized into exactly one clip and consumed once by the compositor,
//! in script order.

mod parser;

pub use parser::{classify_line, parse_script, serialize_script, LineKind};

use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the two hosts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpeakerId {
    /// Host 1
    A,
    /// Host 2
    B,
}

impl SpeakerId {
    /// Label used in script markers
    pub fn label(&self) -> &'static str {
        match self {
            SpeakerId::A => "Host 1",
            SpeakerId::B => "Host 2",
        }
    }
}

impl fmt::Display for SpeakerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// How a segment joins the audio before it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimingTag {
    /// Pause, then a short crossfade
    #[default]
    Normal,
    /// Head of the clip overlaps the tail of the previous speech
    Overlap,
    /// Whole clip overlaid near the end of the previous speech
    Simultaneous,
}

/// A speaker-attributed, timing-tagged piece of dialogue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    /// Non-empty, trimmed text
    pub text: String,
    pub speaker: SpeakerId,
    #[serde(default)]
    pub timing: TimingTag,
}

impl Segment {
    pub fn new(text: impl Into<String>, speaker: SpeakerId, timing: TimingTag) -> Self {
        Self {
            text: text.into(),
            speaker,
            timing,
        }
    }

    pub fn normal(text: impl Into<String>, speaker: SpeakerId) -> Self {
        Self::new(text, speaker, TimingTag::Normal)
    }
}
