//! Loading of 16-bit PCM WAV files into memory.
//!
//! Only 16-bit integer WAVs at the pipeline's sample rate are accepted. Anything else is rejected
//! at load time so that the audio path never has to repair or resample.

use crate::error::{Error, Result};
use crate::utils;
use hound::SampleFormat;
use std::path::{Path, PathBuf};
use time_calc::{Ms, SampleHz, Samples};
use walkdir::WalkDir;

/// An interleaved 16-bit sample buffer loaded from a WAV file.
#[derive(Clone, Debug)]
pub struct Wav {
    pub path: PathBuf,
    pub channels: usize,
    pub sample_rate: u32,
    pub samples: Vec<i16>,
}

impl Wav {
    /// Load the entire WAV at the given path.
    ///
    /// If `ensure_sample_rate` is `Some`, the file's sample rate must match.
    pub fn load(path: &Path, ensure_sample_rate: Option<u32>) -> Result<Self> {
        let reader = hound::WavReader::open(path)?;
        let spec = reader.spec();
        if spec.sample_format != SampleFormat::Int || spec.bits_per_sample != 16 {
            return Err(Error::UnsupportedWav {
                path: path.to_path_buf(),
                bits: spec.bits_per_sample,
                format: spec.sample_format,
            });
        }
        if let Some(expected) = ensure_sample_rate {
            if spec.sample_rate != expected {
                return Err(Error::SampleRateMismatch {
                    path: path.to_path_buf(),
                    expected,
                    found: spec.sample_rate,
                });
            }
        }
        let samples = reader.into_samples::<i16>().collect::<Result<Vec<_>, _>>()?;
        Ok(Wav {
            path: path.to_path_buf(),
            channels: spec.channels as usize,
            sample_rate: spec.sample_rate,
            samples,
        })
    }

    /// The number of frames in the file.
    pub fn n_frames(&self) -> usize {
        self.samples.len() / self.channels.max(1)
    }

    /// The duration of the `Wav` in milliseconds.
    pub fn duration_ms(&self) -> Ms {
        Samples(self.n_frames() as _).to_ms(self.sample_rate as SampleHz)
    }

    /// Only keep the first channel.
    pub fn into_mono(self) -> Vec<i16> {
        if self.channels <= 1 {
            return self.samples;
        }
        self.samples.into_iter().step_by(self.channels).collect()
    }
}

/// Load the WAV at the given path, keeping only its first channel.
pub fn load_mono(path: &Path, sample_rate: u32) -> Result<Vec<i16>> {
    let wav = Wav::load(path, Some(sample_rate))?;
    Ok(wav.into_mono())
}

/// Load every `.wav` file within the given directory as mono, sorted by path.
///
/// Returns an error if the directory contains no WAV files.
pub fn load_dir(dir: &Path, sample_rate: u32) -> Result<Vec<Vec<i16>>> {
    let mut paths = Vec::new();
    for entry in WalkDir::new(dir).max_depth(1) {
        let entry = entry.map_err(|err| match err.into_io_error() {
            Some(io) => Error::Io(io),
            None => Error::NoSamples(dir.to_path_buf()),
        })?;
        let path = entry.path();
        let is_wav = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("wav"))
            .unwrap_or(false);
        if entry.file_type().is_file() && is_wav {
            paths.push(path.to_path_buf());
        }
    }
    if paths.is_empty() {
        return Err(Error::NoSamples(dir.to_path_buf()));
    }
    paths.sort();
    let mut samples = Vec::with_capacity(paths.len());
    for path in paths {
        let wav = Wav::load(&path, Some(sample_rate))?;
        let secs = wav.duration_ms().ms() / utils::SEC_MS;
        log::info!("loaded sample {} ({:.2}s)", path.display(), secs);
        samples.push(wav.into_mono());
    }
    Ok(samples)
}

/// Write an interleaved buffer to a 16-bit WAV file.
pub fn write(path: &Path, channels: usize, sample_rate: u32, samples: &[i16]) -> Result<()> {
    let spec = spec(channels, sample_rate);
    let mut writer = hound::WavWriter::create(path, spec)?;
    for &s in samples {
        writer.write_sample(s)?;
    }
    writer.finalize()?;
    Ok(())
}

/// The WAV spec used for every file written by the pipeline.
pub fn spec(channels: usize, sample_rate: u32) -> hound::WavSpec {
    hound::WavSpec {
        channels: channels as u16,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    }
}
