//! Clip composition
//!
//! [`Sequencer`] joins decoded clips by timing tag into one buffer.
//! [`FallbackChain`] wraps it with simpler strategies so a run still
//! produces a file when the preferred one is unavailable or fails.

mod fallback;
mod sequencer;

pub use fallback::{
    AdaptiveTier, ChainReport, CompositionTier, CopyFirstTier, ExternalConcatTier, FallbackChain,
    ProbabilisticTier, TierAttempt, TierError, TierOutcome,
};
pub use sequencer::{join_normal, join_overlap, join_simultaneous, Composite, CompositionState, Sequencer};

use crate::error::{Error, Result};
use crate::script::{Segment, TimingTag};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One clip file and the timing tag of the segment it was synthesized from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClipInput {
    pub path: PathBuf,
    pub timing: TimingTag,
}

impl ClipInput {
    pub fn new(path: impl Into<PathBuf>, timing: TimingTag) -> Self {
        Self {
            path: path.into(),
            timing,
        }
    }

    /// Pair segments with their clip files by index
    ///
    /// The sequences must have equal length.
    pub fn pair(segments: &[Segment], clips: &[PathBuf]) -> Result<Vec<ClipInput>> {
        if segments.len() != clips.len() {
            return Err(Error::Composition(format!(
                "{} segments but {} clips",
                segments.len(),
                clips.len()
            )));
        }
        Ok(segments
            .iter()
            .zip(clips)
            .map(|(segment, path)| ClipInput::new(path.clone(), segment.timing))
            .collect())
    }
}
