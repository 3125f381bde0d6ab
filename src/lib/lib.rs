//! A real-time audio engine for a swarm of sound travelling between hives of loudspeakers.
//!
//! Samples are carried around the hives by simulated swarms, occasional clips are played through
//! single hives, and optionally live input is looped back. Everything is mixed by a pipeline of
//! threads joined by bounded queues and delivered to a device once per period.

use crate::audio::backend::{ClockedDevice, Device};
use crate::audio::loopback::ChannelRouter;
use crate::audio::source::{OccasionalSource, SourceBank, SwarmSource};
use crate::audio::SampleStream;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::pipeline::Pipeline;
use crate::swarm::Swarm;

pub mod audio;
pub mod config;
pub mod error;
pub mod hive;
pub mod metres;
pub mod pipeline;
pub mod swarm;
pub mod utils;

/// The audio loaded for the sources of the installation.
#[derive(Clone, Debug, Default)]
pub struct Samples {
    /// Looping mono samples, one swarm each.
    pub swarm: Vec<Vec<i16>>,
    /// Mono clips played in turn by a single occasional source.
    pub occasional: Vec<Vec<i16>>,
}

impl Samples {
    /// Load the sample directories named by the config.
    pub fn load(config: &Config) -> Result<Self> {
        let mut samples = Samples::default();
        if let Some(ref dir) = config.swarm_samples {
            samples.swarm = audio::wav::load_dir(dir, config.sample_rate)?;
        }
        if let Some(ref dir) = config.occasional_samples {
            samples.occasional = audio::wav::load_dir(dir, config.sample_rate)?;
        }
        Ok(samples)
    }
}

/// Build the bank of sources described by the config.
///
/// Each swarm sample gets its own swarm, seeded in the order the samples are given. The
/// occasional clips share a single source seeded after the swarms.
pub fn source_bank(config: &Config, samples: Samples) -> Result<SourceBank> {
    config.validate()?;
    let hives = config.hives();
    for (i, hive) in hives.iter().enumerate() {
        log::info!("channel {}: {}", i, hive);
    }
    let points = hive::points(&hives);
    let mut bank = SourceBank::new(config.n_channels, config.master_volume)?;

    let n_swarms = samples.swarm.len() as u64;
    for (i, sample) in samples.swarm.into_iter().enumerate() {
        let rng = utils::rng(config.seed_for(i as u64));
        let swarm = Swarm::new(points.clone(), config.swarm_params(), rng)?;
        let stream = SampleStream::new(sample)?;
        let source = SwarmSource::new(stream, swarm, config.volume_mapper(), config.swarm_volume);
        bank.add(source);
    }

    if !samples.occasional.is_empty() {
        let rng = utils::rng(config.seed_for(n_swarms));
        let source = OccasionalSource::new(
            samples.occasional,
            config.sample_rate,
            config.repeat_period,
            config.occasional_volume,
            rng,
        )?;
        bank.add(source);
    }

    if bank.is_empty() {
        log::warn!("no sources were configured, playback will be silent");
    }
    Ok(bank)
}

/// Create the software device described by the config.
pub fn clocked_device(config: &Config) -> Result<ClockedDevice> {
    let mut device = ClockedDevice::new(config.sample_rate, config.n_channels)?;
    if let Some(ref path) = config.output_wav {
        device = device.with_wav_output(path)?;
    }
    if let Some(ref path) = config.capture_wav {
        device = device.with_capture_wav(path)?;
    }
    if config.loopback {
        match device.capture_channels() {
            Some(channels) if channels != config.capture_channels => {
                return Err(Error::LoopbackInputChannels(channels));
            }
            None => log::warn!("loopback is enabled but the device captures no input"),
            _ => (),
        }
    }
    Ok(device)
}

/// Build the sources and spawn the pipeline driving the given `device`.
pub fn spawn<D>(config: &Config, samples: Samples, device: D) -> Result<pipeline::Handle>
where
    D: Device + Send + 'static,
{
    let bank = source_bank(config, samples)?;
    let mut pipeline = Pipeline::new(bank, config.frames_per_chunk)?
        .queue_capacity(config.queue_capacity)?
        .prefill_chunks(config.prefill_chunks);
    if config.loopback {
        let router = ChannelRouter::new(config.capture_channels, config.n_channels)?;
        pipeline = pipeline.loopback(router)?;
    }
    pipeline.spawn(device)
}
