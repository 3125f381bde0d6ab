//! Routing of live stereo input onto the hive channels.
//!
//! The left input channel is broadcast to the first half of the output channels and the right
//! input channel to the second half.

use crate::audio::block::FrameBlock;
use crate::audio::{BlockSender, CaptureReceiver};
use crate::error::{Error, Result};
use std::ops;

/// The only supported number of loopback input channels.
pub const INPUT_CHANNELS: usize = 2;

/// Maps a 2-channel block onto `channels_out` channels by left/right half split.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChannelRouter {
    channels_out: usize,
}

impl ChannelRouter {
    /// Returns an error unless `channels_in` is `2` and `channels_out` is at least `1`.
    pub fn new(channels_in: usize, channels_out: usize) -> Result<Self> {
        if channels_in != INPUT_CHANNELS {
            return Err(Error::LoopbackInputChannels(channels_in));
        }
        if channels_out == 0 {
            return Err(Error::InvalidChannelCount(channels_out));
        }
        Ok(ChannelRouter { channels_out })
    }

    pub fn channels_out(&self) -> usize {
        self.channels_out
    }

    /// Output channels receiving the left input. The floor of half the outputs.
    pub fn left(&self) -> ops::Range<usize> {
        0..self.channels_out / 2
    }

    /// Output channels receiving the right input. The remainder of the outputs.
    pub fn right(&self) -> ops::Range<usize> {
        self.channels_out / 2..self.channels_out
    }

    /// Route the given stereo block onto the output channels.
    ///
    /// **Panics** if `input` does not have 2 channels.
    pub fn route(&self, input: &FrameBlock) -> FrameBlock {
        assert_eq!(input.channels(), INPUT_CHANNELS);
        let split = self.channels_out / 2;
        let mut output = FrameBlock::silent(input.n_frames(), self.channels_out);
        for (out_frame, in_frame) in output.frames_mut().zip(input.frames()) {
            let (left, right) = out_frame.split_at_mut(split);
            for s in left {
                *s = in_frame[0];
            }
            for s in right {
                *s = in_frame[1];
            }
        }
        output
    }

    /// Reinterpret a raw little-endian capture buffer as stereo and route it.
    pub fn route_bytes(&self, bytes: &[u8]) -> Result<FrameBlock> {
        let input = FrameBlock::from_le_bytes(INPUT_CHANNELS, bytes)?;
        Ok(self.route(&input))
    }
}

/// Run the loopback stage until either of its queues disconnects.
///
/// Captured buffers that cannot be split into stereo frames are logged and skipped.
pub fn run(router: ChannelRouter, capture_rx: CaptureReceiver, loopback_tx: BlockSender) {
    log::info!(
        "loopback routing left -> {:?}, right -> {:?}",
        router.left(),
        router.right()
    );
    for bytes in capture_rx.iter() {
        let block = match router.route_bytes(&bytes) {
            Ok(block) => block,
            Err(err) => {
                log::warn!("dropping malformed capture buffer: {}", err);
                continue;
            }
        };
        if loopback_tx.send(block).is_err() {
            break;
        }
    }
    log::info!("loopback stage stopped");
}
