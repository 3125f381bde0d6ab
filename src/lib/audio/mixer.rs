//! The mixer stage: sums one block from each input queue per tick.
//!
//! Each input is read either blocking, in which case the mixer is clocked by it, or best-effort,
//! in which case a missing block is treated as silence for that tick.

use crate::audio::block::{saturate, FrameBlock};
use crate::audio::stats::Stats;
use crate::audio::{BlockReceiver, BlockSender};
use crossbeam::channel::TryRecvError;
use std::sync::Arc;

/// How the mixer reads from one of its inputs.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ReadMode {
    /// Wait for the next block. The mixer stops if the input disconnects.
    Blocking,
    /// Take a block if one is ready, otherwise mix silence.
    BestEffort,
}

/// A single input queue along with the way it is read.
pub struct Input {
    pub name: &'static str,
    pub mode: ReadMode,
    rx: BlockReceiver,
    connected: bool,
}

/// Sums one block from every input into a block of `n_frames × channels`.
///
/// Blocks with a different frame count contribute their overlapping frames. Blocks with a
/// different channel count are skipped.
pub struct Mixer {
    inputs: Vec<Input>,
    n_frames: usize,
    channels: usize,
    stats: Arc<Stats>,
    // Re-used between ticks.
    accumulator: Vec<i32>,
}

impl Input {
    pub fn new(name: &'static str, rx: BlockReceiver, mode: ReadMode) -> Self {
        Input {
            name,
            mode,
            rx,
            connected: true,
        }
    }
}

impl Mixer {
    /// **Panics** if `channels` is `0`.
    pub fn new(n_frames: usize, channels: usize, stats: Arc<Stats>) -> Self {
        assert!(channels > 0);
        Mixer {
            inputs: Vec::new(),
            n_frames,
            channels,
            stats,
            accumulator: Vec::new(),
        }
    }

    pub fn add_input(&mut self, input: Input) {
        self.inputs.push(input);
    }

    pub fn inputs(&self) -> &[Input] {
        &self.inputs
    }

    /// Read one block from every input and return their sum.
    ///
    /// Returns `None` once a blocking input has disconnected, or once every input has.
    pub fn tick(&mut self) -> Option<FrameBlock> {
        let Mixer {
            ref mut inputs,
            n_frames,
            channels,
            ref stats,
            ref mut accumulator,
        } = *self;

        if inputs.iter().all(|input| !input.connected) {
            return None;
        }

        accumulator.clear();
        accumulator.resize(n_frames * channels, 0);

        for input in inputs.iter_mut() {
            let block = match input.mode {
                ReadMode::Blocking => match input.rx.recv() {
                    Ok(block) => block,
                    Err(_) => {
                        input.connected = false;
                        log::debug!("mixer input `{}` disconnected", input.name);
                        return None;
                    }
                },
                ReadMode::BestEffort => match input.rx.try_recv() {
                    Ok(block) => block,
                    Err(TryRecvError::Empty) => {
                        stats.count_missing_input();
                        continue;
                    }
                    Err(TryRecvError::Disconnected) => {
                        if input.connected {
                            input.connected = false;
                            log::debug!("mixer input `{}` disconnected", input.name);
                        }
                        continue;
                    }
                },
            };

            if block.channels() != channels {
                log::warn!(
                    "mixer input `{}` sent {} channels, expected {}",
                    input.name,
                    block.channels(),
                    channels
                );
                stats.count_missing_input();
                continue;
            }

            for (acc, &sample) in accumulator.iter_mut().zip(block.samples()) {
                *acc += sample as i32;
            }
        }

        let mut out = FrameBlock::silent(n_frames, channels);
        for (out, &acc) in out.samples_mut().iter_mut().zip(accumulator.iter()) {
            *out = saturate(acc);
        }
        Some(out)
    }
}

/// Run the mixer stage until its inputs or its output disconnect.
pub fn run(mut mixer: Mixer, output_tx: BlockSender) {
    log::info!("mixer stage started with {} inputs", mixer.inputs().len());
    while let Some(block) = mixer.tick() {
        if output_tx.send(block).is_err() {
            break;
        }
    }
    log::info!("mixer stage stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam::channel;

    fn block(n_frames: usize, channels: usize, value: i16) -> FrameBlock {
        FrameBlock::from_interleaved(channels, vec![value; n_frames * channels]).unwrap()
    }

    #[test]
    fn sums_every_input() {
        let stats = Arc::new(Stats::new());
        let (a_tx, a_rx) = channel::bounded(1);
        let (b_tx, b_rx) = channel::bounded(1);
        let mut mixer = Mixer::new(4, 2, stats.clone());
        mixer.add_input(Input::new("a", a_rx, ReadMode::Blocking));
        mixer.add_input(Input::new("b", b_rx, ReadMode::BestEffort));
        a_tx.send(block(4, 2, 1_000)).unwrap();
        b_tx.send(block(4, 2, -250)).unwrap();
        let mixed = mixer.tick().unwrap();
        assert!(mixed.samples().iter().all(|&s| s == 750));
        assert_eq!(stats.missing_inputs(), 0);
    }

    #[test]
    fn sums_saturate() {
        let (a_tx, a_rx) = channel::bounded(1);
        let (b_tx, b_rx) = channel::bounded(1);
        let mut mixer = Mixer::new(2, 1, Arc::new(Stats::new()));
        mixer.add_input(Input::new("a", a_rx, ReadMode::Blocking));
        mixer.add_input(Input::new("b", b_rx, ReadMode::Blocking));
        a_tx.send(block(2, 1, 30_000)).unwrap();
        b_tx.send(block(2, 1, 30_000)).unwrap();
        assert_eq!(mixer.tick().unwrap().samples(), &[i16::MAX, i16::MAX]);
        a_tx.send(block(2, 1, -30_000)).unwrap();
        b_tx.send(block(2, 1, -30_000)).unwrap();
        assert_eq!(mixer.tick().unwrap().samples(), &[i16::MIN, i16::MIN]);
    }

    #[test]
    fn best_effort_input_missing_is_silence() {
        let stats = Arc::new(Stats::new());
        let (a_tx, a_rx) = channel::bounded(1);
        let (_b_tx, b_rx) = channel::bounded::<FrameBlock>(1);
        let mut mixer = Mixer::new(3, 2, stats.clone());
        mixer.add_input(Input::new("playback", a_rx, ReadMode::Blocking));
        mixer.add_input(Input::new("loopback", b_rx, ReadMode::BestEffort));
        a_tx.send(block(3, 2, 42)).unwrap();
        let mixed = mixer.tick().unwrap();
        assert!(mixed.samples().iter().all(|&s| s == 42));
        assert_eq!(stats.missing_inputs(), 1);
    }

    #[test]
    fn mismatched_blocks() {
        let stats = Arc::new(Stats::new());
        let (a_tx, a_rx) = channel::bounded(1);
        let (b_tx, b_rx) = channel::bounded(1);
        let mut mixer = Mixer::new(4, 1, stats.clone());
        mixer.add_input(Input::new("a", a_rx, ReadMode::Blocking));
        mixer.add_input(Input::new("b", b_rx, ReadMode::BestEffort));

        // Shorter blocks only cover their own frames.
        a_tx.send(block(4, 1, 10)).unwrap();
        b_tx.send(block(2, 1, 5)).unwrap();
        assert_eq!(mixer.tick().unwrap().samples(), &[15, 15, 10, 10]);

        // Blocks with the wrong channel count are skipped.
        a_tx.send(block(4, 1, 10)).unwrap();
        b_tx.send(block(4, 2, 5)).unwrap();
        assert_eq!(mixer.tick().unwrap().samples(), &[10; 4]);
        assert_eq!(stats.missing_inputs(), 1);
    }

    #[test]
    fn stops_when_blocking_input_disconnects() {
        let (a_tx, a_rx) = channel::bounded(2);
        let (out_tx, out_rx) = channel::bounded(2);
        let mut mixer = Mixer::new(2, 1, Arc::new(Stats::new()));
        mixer.add_input(Input::new("a", a_rx, ReadMode::Blocking));
        a_tx.send(block(2, 1, 7)).unwrap();
        drop(a_tx);
        run(mixer, out_tx);
        let blocks: Vec<_> = out_rx.iter().collect();
        assert_eq!(blocks, vec![block(2, 1, 7)]);
    }

    #[test]
    fn no_connected_inputs() {
        let (b_tx, b_rx) = channel::bounded::<FrameBlock>(1);
        let mut mixer = Mixer::new(2, 1, Arc::new(Stats::new()));
        mixer.add_input(Input::new("b", b_rx, ReadMode::BestEffort));
        drop(b_tx);
        // The first tick discovers the disconnection.
        assert!(mixer.tick().is_some());
        assert!(mixer.tick().is_none());
        assert!(Mixer::new(2, 1, Arc::new(Stats::new())).tick().is_none());
    }
}
