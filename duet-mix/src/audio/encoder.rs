//! Output encoding
//!
//! The container is chosen from the output file's extension: `.wav` is
//! 16-bit PCM via hound, `.mp3` (or no extension) is LAME at a configurable
//! constant bitrate.

use super::types::{AudioClip, CHANNELS};
use crate::error::{Error, Result};
use mp3lame_encoder::{Bitrate, Builder, DualPcm, FlushNoGap, Quality};
use std::path::Path;
use tracing::debug;

/// Frames handed to LAME per encode call
const MP3_CHUNK_FRAMES: usize = 44100;

/// Output container
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Mp3 { bitrate_kbps: u32 },
    Wav,
}

impl OutputFormat {
    /// Pick the container from the path's extension
    pub fn from_path(path: &Path, bitrate_kbps: u32) -> Result<Self> {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref()
        {
            None | Some("mp3") => Ok(OutputFormat::Mp3 { bitrate_kbps }),
            Some("wav") => Ok(OutputFormat::Wav),
            Some(other) => Err(Error::Encode(format!(
                "Unsupported output extension '.{}' (expected .mp3 or .wav)",
                other
            ))),
        }
    }
}

/// Map a kbps value onto a LAME bitrate
pub fn bitrate_from_kbps(kbps: u32) -> Result<Bitrate> {
    let bitrate = match kbps {
        64 => Bitrate::Kbps64,
        80 => Bitrate::Kbps80,
        96 => Bitrate::Kbps96,
        112 => Bitrate::Kbps112,
        128 => Bitrate::Kbps128,
        160 => Bitrate::Kbps160,
        192 => Bitrate::Kbps192,
        224 => Bitrate::Kbps224,
        256 => Bitrate::Kbps256,
        320 => Bitrate::Kbps320,
        other => {
            return Err(Error::Config(format!(
                "Unsupported MP3 bitrate {} kbps (use 64, 80, 96, 112, 128, 160, 192, 224, 256 or 320)",
                other
            )))
        }
    };
    Ok(bitrate)
}

/// Encode `clip` to `path`, container chosen by extension
pub fn encode_to_file(clip: &AudioClip, path: &Path, bitrate_kbps: u32) -> Result<()> {
    let format = OutputFormat::from_path(path, bitrate_kbps)?;
    let bytes = match format {
        OutputFormat::Mp3 { bitrate_kbps } => encode_mp3(clip, bitrate_kbps)?,
        OutputFormat::Wav => encode_wav(clip)?,
    };
    std::fs::write(path, &bytes)?;

    debug!(
        path = %path.display(),
        ?format,
        bytes = bytes.len(),
        duration_ms = clip.duration_ms(),
        "Encoded output"
    );
    Ok(())
}

fn to_i16(sample: f32) -> i16 {
    (sample.clamp(-1.0, 1.0) * i16::MAX as f32).round() as i16
}

/// Encode to an in-memory MP3 stream
pub fn encode_mp3(clip: &AudioClip, bitrate_kbps: u32) -> Result<Vec<u8>> {
    let mut builder =
        Builder::new().ok_or_else(|| Error::Encode("Failed to create LAME builder".to_string()))?;
    builder
        .set_num_channels(CHANNELS as u8)
        .map_err(|e| Error::Encode(format!("LAME channels: {:?}", e)))?;
    builder
        .set_sample_rate(clip.sample_rate)
        .map_err(|e| Error::Encode(format!("LAME sample rate: {:?}", e)))?;
    builder
        .set_brate(bitrate_from_kbps(bitrate_kbps)?)
        .map_err(|e| Error::Encode(format!("LAME bitrate: {:?}", e)))?;
    builder
        .set_quality(Quality::Best)
        .map_err(|e| Error::Encode(format!("LAME quality: {:?}", e)))?;
    let mut encoder = builder
        .build()
        .map_err(|e| Error::Encode(format!("LAME init: {:?}", e)))?;

    let mut out: Vec<u8> = Vec::new();
    for chunk in clip.samples.chunks(MP3_CHUNK_FRAMES * CHANNELS) {
        let (left, right): (Vec<i16>, Vec<i16>) = chunk
            .chunks_exact(CHANNELS)
            .map(|frame| (to_i16(frame[0]), to_i16(frame[1])))
            .unzip();

        out.reserve(mp3lame_encoder::max_required_buffer_size(left.len()));
        encoder
            .encode_to_vec(
                DualPcm {
                    left: &left[..],
                    right: &right[..],
                },
                &mut out,
            )
            .map_err(|e| Error::Encode(format!("LAME encode: {:?}", e)))?;
    }

    out.reserve(7200);
    encoder
        .flush_to_vec::<FlushNoGap>(&mut out)
        .map_err(|e| Error::Encode(format!("LAME flush: {:?}", e)))?;

    Ok(out)
}

/// Encode to an in-memory 16-bit PCM WAV file
pub fn encode_wav(clip: &AudioClip) -> Result<Vec<u8>> {
    let spec = hound::WavSpec {
        channels: CHANNELS as u16,
        sample_rate: clip.sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = std::io::Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec)
            .map_err(|e| Error::Encode(format!("WAV header: {}", e)))?;
        for &sample in &clip.samples {
            writer
                .write_sample(to_i16(sample))
                .map_err(|e| Error::Encode(format!("WAV write: {}", e)))?;
        }
        writer
            .finalize()
            .map_err(|e| Error::Encode(format!("WAV finalize: {}", e)))?;
    }
    Ok(cursor.into_inner())
}
