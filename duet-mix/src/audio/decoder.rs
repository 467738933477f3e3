//! Clip decoder using symphonia
//!
//! Decodes synthesized clips (MP3 from the providers, WAV/FLAC/AAC/Vorbis
//! from other sources) to interleaved stereo f32 at the working rate.

use super::resampler::{Resampler, WORKING_SAMPLE_RATE};
use super::types::{AudioClip, CHANNELS};
use crate::error::{Error, Result};
use std::path::Path;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::{debug, warn};

/// Decodes clip files into [`AudioClip`]s.
pub struct ClipDecoder;

impl ClipDecoder {
    /// Decode, mix to stereo and resample an entire file
    pub fn decode_file(path: &Path) -> Result<AudioClip> {
        let (samples, sample_rate, channels) = Self::decode_raw(path)?;
        let stereo = Self::to_stereo(samples, channels);
        let resampled = Resampler::resample(&stereo, sample_rate, CHANNELS as u16)?;

        // Resampler output is whole frames; guard anyway before wrapping
        let whole = resampled.len() - resampled.len() % CHANNELS;
        let mut resampled = resampled;
        resampled.truncate(whole);

        let clip = AudioClip::new(resampled, WORKING_SAMPLE_RATE);
        debug!(
            path = %path.display(),
            duration_ms = clip.duration_ms(),
            source_rate = sample_rate,
            source_channels = channels,
            "Decoded clip"
        );
        Ok(clip)
    }

    /// Decode to interleaved f32 at the source rate and channel count
    ///
    /// # Returns
    /// - `samples`: interleaved f32 samples
    /// - `sample_rate`: source sample rate
    /// - `channels`: source channel count
    pub fn decode_raw(path: &Path) -> Result<(Vec<f32>, u32, usize)> {
        let file = std::fs::File::open(path)
            .map_err(|e| Error::Decode(format!("Failed to open file {}: {}", path.display(), e)))?;

        let mss = MediaSourceStream::new(Box::new(file), Default::default());

        // Hint the format registry with the extension
        let mut hint = Hint::new();
        if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
            hint.with_extension(ext);
        }

        let detected = symphonia::default::get_probe()
            .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
            .map_err(|e| {
                Error::Decode(format!("Failed to detect format of {}: {}", path.display(), e))
            })?;

        let mut format = detected.format;

        let track = format
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or_else(|| Error::Decode(format!("No audio track in {}", path.display())))?;

        let track_id = track.id;
        let mut sample_rate = track.codec_params.sample_rate;
        let mut channels = track.codec_params.channels.map(|c| c.count());

        let mut decoder = symphonia::default::get_codecs()
            .make(&track.codec_params, &DecoderOptions::default())
            .map_err(|e| Error::Decode(format!("Failed to create decoder: {}", e)))?;

        let mut samples = Vec::new();

        loop {
            let packet = match format.next_packet() {
                Ok(packet) => packet,
                Err(SymphoniaError::IoError(ref e))
                    if e.kind() == std::io::ErrorKind::UnexpectedEof =>
                {
                    break;
                }
                Err(e) => {
                    warn!("Error reading packet from {}: {}", path.display(), e);
                    break;
                }
            };

            if packet.track_id() != track_id {
                continue;
            }

            match decoder.decode(&packet) {
                Ok(decoded) => {
                    let spec = *decoded.spec();
                    sample_rate.get_or_insert(spec.rate);
                    channels.get_or_insert(spec.channels.count());

                    let mut buf = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
                    buf.copy_interleaved_ref(decoded);
                    samples.extend_from_slice(buf.samples());
                }
                Err(SymphoniaError::DecodeError(e)) => {
                    // Corrupt frame; skip it and keep going
                    warn!("Decode error in {}: {}", path.display(), e);
                }
                Err(e) => {
                    return Err(Error::Decode(format!(
                        "Failed to decode {}: {}",
                        path.display(),
                        e
                    )))
                }
            }
        }

        let sample_rate = sample_rate
            .ok_or_else(|| Error::Decode(format!("Sample rate not found in {}", path.display())))?;
        let channels = channels.unwrap_or(1).max(1);

        Ok((samples, sample_rate, channels))
    }

    /// Reduce or expand interleaved audio to two channels
    ///
    /// Mono is duplicated; extra channels beyond the first two are dropped.
    pub fn to_stereo(samples: Vec<f32>, channels: usize) -> Vec<f32> {
        match channels {
            2 => samples,
            1 => samples.iter().flat_map(|&s| [s, s]).collect(),
            n => samples
                .chunks_exact(n)
                .flat_map(|frame| [frame[0], frame[1]])
                .collect(),
        }
    }
}
