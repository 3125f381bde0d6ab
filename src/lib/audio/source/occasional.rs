//! A source that plays a clip through a single random hive at a fixed interval.

use super::Source;
use crate::error::{Error, Result};
use crate::utils;
use rand::rngs::StdRng;
use rand::Rng;
use std::sync::Arc;

/// Ten minutes between plays.
pub const DEFAULT_REPEAT_PERIOD_SECS: f64 = 600.0;

/// Plays each of its clips in turn, separated by `repeat_period` seconds of silence.
///
/// Each play is routed to a single channel chosen at random. All other channels are silent. With
/// no channels to choose from, nothing is produced and the cycle does not advance.
pub struct OccasionalSource {
    clips: Vec<Arc<[i16]>>,
    // The index of the clip that plays next.
    clip: usize,
    repeat_frames: usize,
    /// A fixed gain applied to every clip.
    pub volume: f32,
    state: State,
    rng: StdRng,
}

/// The current state of the playback cycle.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum State {
    /// Silent, counting down to the next play.
    Waiting { frames_till_next_play: usize },
    /// Playing the current clip through `channel`, with `frame` the next frame of the clip.
    Playing { channel: usize, frame: usize },
}

impl OccasionalSource {
    /// Create a source that first plays after `repeat_period_secs`.
    ///
    /// Returns an error if there are no clips or any clip is empty.
    pub fn new(
        clips: Vec<Vec<i16>>,
        sample_rate: u32,
        repeat_period_secs: f64,
        volume: f32,
        rng: StdRng,
    ) -> Result<Self> {
        if clips.is_empty() || clips.iter().any(|c| c.is_empty()) {
            return Err(Error::EmptySampleBuffer);
        }
        if !(repeat_period_secs.is_finite() && repeat_period_secs >= 0.0) {
            let reason = format!("{} must be >= 0", repeat_period_secs);
            return Err(Error::invalid("repeat_period", reason));
        }
        let clips: Vec<Arc<[i16]>> = clips.into_iter().map(Arc::from).collect();
        let repeat_frames = utils::secs_to_frames(repeat_period_secs, sample_rate);
        Ok(OccasionalSource {
            clips,
            clip: 0,
            repeat_frames,
            volume,
            state: State::Waiting {
                frames_till_next_play: repeat_frames,
            },
            rng,
        })
    }

    pub fn state(&self) -> State {
        self.state
    }
}

impl Source for OccasionalSource {
    fn produce_into(&mut self, out: &mut [f32], n_frames: usize, n_channels: usize) {
        if n_channels == 0 {
            return;
        }
        let mut frame = 0;
        while frame < n_frames {
            let remaining = n_frames - frame;
            match self.state {
                State::Waiting {
                    frames_till_next_play: 0,
                } => {
                    let channel = self.rng.gen_range(0..n_channels);
                    log::debug!(
                        "occasional source playing clip {} on channel {}",
                        self.clip,
                        channel
                    );
                    self.state = State::Playing { channel, frame: 0 };
                }
                State::Waiting {
                    frames_till_next_play,
                } => {
                    let n = std::cmp::min(frames_till_next_play, remaining);
                    frame += n;
                    self.state = State::Waiting {
                        frames_till_next_play: frames_till_next_play - n,
                    };
                }
                State::Playing {
                    channel,
                    frame: clip_frame,
                } => {
                    let clip = &self.clips[self.clip];
                    let n = std::cmp::min(clip.len() - clip_frame, remaining);
                    if channel < n_channels {
                        let samples = clip[clip_frame..clip_frame + n].iter();
                        for (i, &sample) in samples.enumerate() {
                            out[(frame + i) * n_channels + channel] += sample as f32 * self.volume;
                        }
                    }
                    frame += n;
                    let clip_frame = clip_frame + n;
                    if clip_frame == clip.len() {
                        self.clip = (self.clip + 1) % self.clips.len();
                        self.state = State::Waiting {
                            frames_till_next_play: self.repeat_frames,
                        };
                    } else {
                        self.state = State::Playing {
                            channel,
                            frame: clip_frame,
                        };
                    }
                }
            }
        }
    }
}
