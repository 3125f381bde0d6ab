//! Errors that may occur while constructing the audio pipeline.
//!
//! All of these are raised before the real-time stages start. Once audio is flowing, anomalies
//! are counted in `audio::stats::Stats` and degrade to silence instead.

use std::io;
use std::path::PathBuf;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid channel count {0}: at least one channel is required")]
    InvalidChannelCount(usize),
    #[error("sample buffer is empty")]
    EmptySampleBuffer,
    #[error("sample rate of {path:?} is {found}Hz but the pipeline runs at {expected}Hz")]
    SampleRateMismatch {
        path: PathBuf,
        expected: u32,
        found: u32,
    },
    #[error("unsupported WAV format in {path:?}: {bits} bit {format:?} (only 16 bit int is supported)")]
    UnsupportedWav {
        path: PathBuf,
        bits: u16,
        format: hound::SampleFormat,
    },
    #[error("loopback requires exactly 2 input channels but {0} were given")]
    LoopbackInputChannels(usize),
    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },
    #[error("block of {len} samples cannot be split into frames of {channels} channels")]
    MalformedBlock { len: usize, channels: usize },
    #[error("no WAV files found in {0:?}")]
    NoSamples(PathBuf),
    #[error("failed to spawn the `{name}` thread: {source}")]
    Spawn {
        name: &'static str,
        #[source]
        source: io::Error,
    },
    #[error("device error: {0}")]
    Device(String),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Wav(#[from] hound::Error),
    #[error(transparent)]
    Toml(#[from] toml::de::Error),
}

impl Error {
    /// Shorthand for an `InvalidParameter` error.
    pub fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        Error::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}
