//! Audio buffers and transforms
//!
//! Everything downstream of decoding works on [`AudioClip`]: interleaved
//! stereo `f32` at [`WORKING_SAMPLE_RATE`].

pub mod decoder;
pub mod encoder;
pub mod loudness;
pub mod resampler;
pub mod silence;
pub mod types;

pub use decoder::ClipDecoder;
pub use encoder::{encode_to_file, OutputFormat};
pub use resampler::{Resampler, WORKING_SAMPLE_RATE};
pub use silence::TrimProfile;
pub use types::AudioClip;
