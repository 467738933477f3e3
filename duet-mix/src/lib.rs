//! # Duet Mix Library (duet-mix)
//!
//! Turns a marked-up two-host dialogue script into one continuous audio track.
//!
//! **Pipeline:** script text → [`script::parse_script`] → per-segment speech
//! synthesis ([`synth`]) → clip files → [`compose::FallbackChain`] → output file
//! plus the residual script record.
//!
//! **Architecture:** sequential, single buffer. Clips are decoded with
//! symphonia, resampled with rubato to 44.1kHz stereo, joined by timing tag
//! and encoded with LAME or hound.

pub mod audio;
pub mod compose;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod script;
pub mod synth;

pub use config::Config;
pub use error::{Error, Result, Stage};
