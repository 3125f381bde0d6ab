//! The `FrameBlock` type passed between each stage of the pipeline.

use crate::error::{Error, Result};
use std::slice;

/// A fixed-shape slab of `n_frames × channels` signed 16-bit samples, interleaved by channel.
///
/// Blocks are moved through the pipeline queues by value. Once a stage has sent a block it no
/// longer has access to it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameBlock {
    channels: usize,
    samples: Vec<i16>,
}

impl FrameBlock {
    /// A block of silence with the given shape.
    pub fn silent(n_frames: usize, channels: usize) -> Self {
        assert!(channels > 0, "a block must have at least one channel");
        FrameBlock {
            channels,
            samples: vec![0; n_frames * channels],
        }
    }

    /// Wrap an interleaved sample buffer.
    ///
    /// Returns an error if `samples` does not contain a whole number of frames.
    pub fn from_interleaved(channels: usize, samples: Vec<i16>) -> Result<Self> {
        if channels == 0 {
            return Err(Error::InvalidChannelCount(channels));
        }
        if samples.len() % channels != 0 {
            let len = samples.len();
            return Err(Error::MalformedBlock { len, channels });
        }
        Ok(FrameBlock { channels, samples })
    }

    /// Reinterpret a raw little-endian capture buffer of `n_frames × channels × 2` bytes.
    pub fn from_le_bytes(channels: usize, bytes: &[u8]) -> Result<Self> {
        if channels == 0 {
            return Err(Error::InvalidChannelCount(channels));
        }
        if bytes.len() % (channels * 2) != 0 {
            let len = bytes.len();
            return Err(Error::MalformedBlock { len, channels });
        }
        let samples = bytes
            .chunks_exact(2)
            .map(|b| i16::from_le_bytes([b[0], b[1]]))
            .collect();
        Ok(FrameBlock { channels, samples })
    }

    /// Serialise the interleaved samples to little-endian bytes.
    pub fn to_le_bytes(&self) -> Vec<u8> {
        self.samples.iter().flat_map(|s| s.to_le_bytes()).collect()
    }

    /// The number of channels in each frame.
    pub fn channels(&self) -> usize {
        self.channels
    }

    /// The number of frames in the block.
    pub fn n_frames(&self) -> usize {
        self.samples.len() / self.channels
    }

    /// The interleaved samples.
    pub fn samples(&self) -> &[i16] {
        &self.samples
    }

    pub fn samples_mut(&mut self) -> &mut [i16] {
        &mut self.samples
    }

    pub fn into_samples(self) -> Vec<i16> {
        self.samples
    }

    /// An iterator yielding each frame as a slice of `channels` samples.
    pub fn frames(&self) -> slice::ChunksExact<i16> {
        self.samples.chunks_exact(self.channels)
    }

    pub fn frames_mut(&mut self) -> slice::ChunksExactMut<i16> {
        self.samples.chunks_exact_mut(self.channels)
    }

    /// The sample at the given frame and channel.
    ///
    /// **Panics** if either index is out of range.
    pub fn get(&self, frame: usize, channel: usize) -> i16 {
        assert!(channel < self.channels);
        self.samples[frame * self.channels + channel]
    }

    pub fn set(&mut self, frame: usize, channel: usize, sample: i16) {
        assert!(channel < self.channels);
        self.samples[frame * self.channels + channel] = sample;
    }

    /// An iterator yielding every sample of a single channel.
    pub fn channel(&self, channel: usize) -> impl Iterator<Item = i16> + '_ {
        assert!(channel < self.channels);
        self.samples.iter().skip(channel).step_by(self.channels).cloned()
    }

    /// The largest absolute sample value on the given channel.
    pub fn channel_peak(&self, channel: usize) -> u16 {
        self.channel(channel).map(i16::unsigned_abs).max().unwrap_or(0)
    }

    /// The largest absolute sample value across all channels.
    pub fn peak(&self) -> u16 {
        self.samples.iter().map(|s| s.unsigned_abs()).max().unwrap_or(0)
    }

    pub fn is_silent(&self) -> bool {
        self.samples.iter().all(|&s| s == 0)
    }
}

/// Convert an accumulated floating point sample to the output format.
///
/// Truncates toward zero and saturates at the `i16` bounds.
pub fn quantize(sample: f32) -> i16 {
    sample as i16
}

/// Saturate a widened integer sum back to the output format.
pub fn saturate(sample: i32) -> i16 {
    sample.clamp(i16::MIN as i32, i16::MAX as i32) as i16
}
