//! A looping sample panned across the hives by the swarm.

use super::Source;
use crate::audio::rbf::VolumeMapper;
use crate::audio::sample_stream::SampleStream;
use crate::metres::Point2;
use crate::swarm::Swarm;

/// Plays a looping mono sample on every hive, scaling each hive by its proximity to the swarm.
///
/// Channel `i` is rendered with the gain of hive `i`. Channels without a hive are silent.
pub struct SwarmSource {
    stream: SampleStream,
    swarm: Swarm,
    mapper: VolumeMapper,
    /// A fixed gain applied on top of the hive gains.
    pub volume: f32,
    // Buffers re-used between calls to `produce`.
    samples: Vec<i16>,
    positions: Vec<Point2>,
}

impl SwarmSource {
    pub fn new(stream: SampleStream, swarm: Swarm, mapper: VolumeMapper, volume: f32) -> Self {
        SwarmSource {
            stream,
            swarm,
            mapper,
            volume,
            samples: Vec::new(),
            positions: Vec::new(),
        }
    }

    pub fn swarm(&self) -> &Swarm {
        &self.swarm
    }
}

impl Source for SwarmSource {
    fn produce_into(&mut self, out: &mut [f32], n_frames: usize, n_channels: usize) {
        let SwarmSource {
            ref mut stream,
            ref mut swarm,
            mapper,
            volume,
            ref mut samples,
            ref mut positions,
        } = *self;

        samples.clear();
        samples.resize(n_frames, 0);
        stream.retrieve_into(samples);

        positions.clear();
        swarm.advance_into(n_frames, positions);

        let hives = swarm.hives();
        let iter = out
            .chunks_exact_mut(n_channels)
            .zip(samples.iter())
            .zip(positions.iter());
        for ((frame, &sample), &position) in iter {
            let sample = sample as f32 * volume;
            for (out, gain) in frame.iter_mut().zip(mapper.hive_gains(hives, position)) {
                *out += sample * gain as f32;
            }
        }
    }
}
