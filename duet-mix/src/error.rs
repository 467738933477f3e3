//! Error types for duet-mix
//!
//! Every variant belongs to one pipeline stage so a failed run can say where
//! it stopped (see [`Error::stage`]).

use std::path::PathBuf;
use thiserror::Error;

/// Pipeline stage that produced an error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Config,
    Synthesis,
    Composition,
    Io,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Stage::Config => "config",
            Stage::Synthesis => "synthesis",
            Stage::Composition => "composition",
            Stage::Io => "io",
        };
        f.write_str(name)
    }
}

/// Main error type for duet-mix
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration loading or validation errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Shared-crate errors (config discovery, TOML)
    #[error(transparent)]
    Common(#[from] duet_common::Error),

    /// A segment's audio could not be produced
    #[error("Synthesis failed for segment {index}: {message}")]
    Synthesis { index: usize, message: String },

    /// Speech provider request errors (no segment context yet)
    #[error("Speech provider error: {0}")]
    Provider(String),

    /// Audio decoding errors
    #[error("Audio decode error: {0}")]
    Decode(String),

    /// Audio encoding errors
    #[error("Audio encode error: {0}")]
    Encode(String),

    /// Composition input or join errors
    #[error("Composition error: {0}")]
    Composition(String),

    /// The final output could not be written by any strategy
    #[error("Failed to write output {path}: {message}")]
    OutputWrite { path: PathBuf, message: String },

    /// File I/O errors
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Manifest serialization errors
    #[error("Manifest error: {0}")]
    Manifest(#[from] serde_json::Error),
}

impl Error {
    /// Stage of the pipeline this error is attributed to
    pub fn stage(&self) -> Stage {
        match self {
            Error::Config(_) | Error::Common(_) => Stage::Config,
            Error::Synthesis { .. } | Error::Provider(_) => Stage::Synthesis,
            Error::Decode(_) | Error::Encode(_) | Error::Composition(_) => Stage::Composition,
            Error::OutputWrite { .. } | Error::Io(_) | Error::Manifest(_) => Stage::Io,
        }
    }
}

/// Convenience Result type using duet-mix Error
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_attribution() {
        let e = Error::Synthesis { index: 3, message: "HTTP 500".into() };
        assert_eq!(e.stage(), Stage::Synthesis);
        assert_eq!(e.to_string(), "Synthesis failed for segment 3: HTTP 500");

        let e = Error::OutputWrite { path: "out.mp3".into(), message: "denied".into() };
        assert_eq!(e.stage(), Stage::Io);
        assert_eq!(Error::Decode("x".into()).stage(), Stage::Composition);
        assert_eq!(Stage::Composition.to_string(), "composition");
    }
}
