//! The hardware-facing end of the pipeline.
//!
//! A device calls `FrameProvider::deliver` once per period. Whether the device drives the cadence
//! through a callback or is driven by a blocking pull loop (see `backend::run`), the provider never
//! blocks: when the output queue cannot serve a full period the remainder is filled with silence.

use crate::audio::block::FrameBlock;
use crate::audio::stats::Stats;
use crate::audio::{BlockReceiver, CaptureSender};
use crossbeam::channel::TrySendError;
use std::ops;
use std::sync::Arc;

/// Types that can hand a block of audio to a device once per period.
pub trait FrameProvider: Send {
    /// Return exactly `n_frames` frames of output.
    ///
    /// `captured` is the raw input buffer captured by the device during the same period, if any.
    fn deliver(&mut self, n_frames: usize, captured: Option<&[u8]>) -> FrameBlock;
}

/// Serves blocks from the mixer output queue to the device.
pub struct OutputConsumer {
    output_rx: BlockReceiver,
    channels: usize,
    // Silent periods still to be served before reading from the queue.
    prefill_remaining: usize,
    capture_tx: Option<CaptureSender>,
    recording_tx: Option<CaptureSender>,
    stats: Arc<Stats>,
    // `Some` if part of a received block has not yet been delivered.
    pending: Option<(FrameBlock, ops::Range<usize>)>,
}

impl OutputConsumer {
    /// **Panics** if `channels` is `0`.
    pub fn new(
        output_rx: BlockReceiver,
        channels: usize,
        prefill_chunks: usize,
        stats: Arc<Stats>,
    ) -> Self {
        assert!(channels > 0);
        OutputConsumer {
            output_rx,
            channels,
            prefill_remaining: prefill_chunks,
            capture_tx: None,
            recording_tx: None,
            stats,
            pending: None,
        }
    }

    /// Forward captured input to the loopback stage.
    pub fn with_capture(mut self, tx: CaptureSender) -> Self {
        self.capture_tx = Some(tx);
        self
    }

    /// Forward captured input to a recording consumer.
    pub fn with_recording(mut self, tx: CaptureSender) -> Self {
        self.recording_tx = Some(tx);
        self
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    pub fn is_prefilling(&self) -> bool {
        self.prefill_remaining > 0
    }

    // Pass the captured buffer on without ever waiting on a full queue.
    fn forward_capture(&mut self, captured: &[u8]) {
        let OutputConsumer {
            ref mut capture_tx,
            ref mut recording_tx,
            ref stats,
            ..
        } = *self;
        for slot in [capture_tx, recording_tx] {
            let disconnected = match slot {
                Some(tx) => match tx.try_send(captured.to_vec()) {
                    Ok(()) => false,
                    Err(TrySendError::Full(_)) => {
                        stats.count_dropped_capture();
                        false
                    }
                    Err(TrySendError::Disconnected(_)) => true,
                },
                None => false,
            };
            if disconnected {
                *slot = None;
            }
        }
    }

    // Fill `out` from the pending block and then the queue. Returns `false` on underrun.
    fn fill(&mut self, out: &mut FrameBlock) -> bool {
        let OutputConsumer {
            ref output_rx,
            channels,
            ref mut pending,
            ..
        } = *self;

        let n_frames = out.n_frames();
        let mut start = 0;
        while start < n_frames {
            let (block, range) = match pending.take() {
                Some(pending) => pending,
                None => match output_rx.try_recv() {
                    Ok(block) => {
                        if block.channels() != channels {
                            log::warn!(
                                "output dropped a block of {} channels, expected {}",
                                block.channels(),
                                channels
                            );
                            continue;
                        }
                        let range = 0..block.n_frames();
                        (block, range)
                    }
                    Err(_) => return false,
                },
            };

            let n = std::cmp::min(range.len(), n_frames - start);
            let src = &block.samples()[range.start * channels..(range.start + n) * channels];
            out.samples_mut()[start * channels..(start + n) * channels].copy_from_slice(src);
            start += n;

            if n < range.len() {
                *pending = Some((block, range.start + n..range.end));
            }
        }
        true
    }
}

impl FrameProvider for OutputConsumer {
    fn deliver(&mut self, n_frames: usize, captured: Option<&[u8]>) -> FrameBlock {
        if let Some(captured) = captured {
            self.forward_capture(captured);
        }
        self.stats.count_delivered();

        let mut out = FrameBlock::silent(n_frames, self.channels);
        if self.prefill_remaining > 0 {
            self.prefill_remaining -= 1;
            if self.prefill_remaining == 0 {
                log::debug!("output prefill complete");
            }
            return out;
        }

        if !self.fill(&mut out) {
            self.stats.count_underrun();
        }
        out
    }
}
