//! The playback producer stage.

use crate::audio::source::SourceBank;
use crate::audio::BlockSender;

/// Produce chunks of `frames_per_chunk` frames from the `bank` until the playback queue
/// disconnects.
///
/// Sending blocks while the queue is full, so the producer runs at most `capacity` chunks ahead of
/// the mixer.
pub fn run(mut bank: SourceBank, frames_per_chunk: usize, playback_tx: BlockSender) {
    log::info!(
        "playback stage started with {} sources, {} frames per chunk",
        bank.len(),
        frames_per_chunk
    );
    let mut chunks = 0u64;
    loop {
        let block = bank.produce(frames_per_chunk);
        if playback_tx.send(block).is_err() {
            break;
        }
        chunks += 1;
    }
    log::info!("playback stage stopped after {} chunks", chunks);
}
