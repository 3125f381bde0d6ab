//! Items related to audio sources.
//!
//! A **Source** produces a block of frames on request. Sources come in two kinds out of the box:
//!
//! 1. **Swarm** - a looping sample whose volume on each hive follows the simulated swarm.
//! 2. **Occasional** - a one-shot clip played through a random hive at a fixed interval.
//!
//! All sources are summed by the **SourceBank** before being sent to the playback queue.

use crate::audio::block::{quantize, FrameBlock};
use crate::error::{Error, Result};

pub use self::occasional::OccasionalSource;
pub use self::swarm::SwarmSource;

pub mod occasional;
pub mod swarm;

/// Types that can produce audio for the playback producer.
///
/// Sources render in `f32` so that the bank can sum them before any rounding takes place.
pub trait Source: Send {
    /// Add the next `n_frames` frames of audio across `n_channels` channels onto `out`.
    ///
    /// `out` is interleaved and holds exactly `n_frames * n_channels` samples. Sources must add
    /// to the existing contents rather than overwrite them. Implementations may panic if
    /// `n_channels` is `0`.
    fn produce_into(&mut self, out: &mut [f32], n_frames: usize, n_channels: usize);

    /// Produce the next `n_frames` frames of audio across `n_channels` channels as a block of
    /// their own.
    ///
    /// **Panics** if `n_channels` is `0`.
    fn produce(&mut self, n_frames: usize, n_channels: usize) -> FrameBlock {
        let mut block = FrameBlock::silent(n_frames, n_channels);
        let mut out = vec![0.0; n_frames * n_channels];
        self.produce_into(&mut out, n_frames, n_channels);
        for (sample, &value) in block.samples_mut().iter_mut().zip(out.iter()) {
            *sample = quantize(value);
        }
        block
    }
}

impl<S> Source for Box<S>
where
    S: Source + ?Sized,
{
    fn produce_into(&mut self, out: &mut [f32], n_frames: usize, n_channels: usize) {
        (**self).produce_into(out, n_frames, n_channels)
    }
}

/// The set of sources that are summed to produce playback.
///
/// Sources are added before the pipeline starts and remain for its lifetime.
pub struct SourceBank {
    sources: Vec<Box<dyn Source>>,
    channels: usize,
    /// Applied to the summed output of all sources.
    pub master_volume: f32,
    // Re-used between calls to `produce`.
    accumulator: Vec<f32>,
}

impl SourceBank {
    /// Create an empty bank producing `channels` channels.
    pub fn new(channels: usize, master_volume: f32) -> Result<Self> {
        if channels == 0 {
            return Err(Error::InvalidChannelCount(channels));
        }
        Ok(SourceBank {
            sources: Vec::new(),
            channels,
            master_volume,
            accumulator: Vec::new(),
        })
    }

    pub fn add<S>(&mut self, source: S)
    where
        S: Source + 'static,
    {
        self.sources.push(Box::new(source));
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Sum the next `n_frames` of every source and apply the master volume.
    ///
    /// Every source adds into a shared `f32` buffer and the result is quantized once at the end,
    /// so no intermediate sum can overflow or lose a quiet contribution to rounding.
    pub fn produce(&mut self, n_frames: usize) -> FrameBlock {
        let SourceBank {
            ref mut sources,
            channels,
            master_volume,
            ref mut accumulator,
        } = *self;

        accumulator.clear();
        accumulator.resize(n_frames * channels, 0.0);

        for source in sources.iter_mut() {
            source.produce_into(accumulator, n_frames, channels);
        }

        let mut out = FrameBlock::silent(n_frames, channels);
        for (out, &acc) in out.samples_mut().iter_mut().zip(accumulator.iter()) {
            *out = quantize(acc * master_volume);
        }
        out
    }
}
