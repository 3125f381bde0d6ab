//! The orchestrator owning every queue and stage thread of the real-time pipeline.
//!
//! ```text
//! playback ──► playback queue ──┐
//!                               ├─► mixer ──► output queue ──► output ──► device
//! loopback ──► loopback queue ──┘                                │
//!    ▲                                                           │
//!    └──────────────────────── capture queue ◄───────────────────┤
//!                              recording queue ◄─────────────────┘
//! ```
//!
//! Each stage runs on its own named thread. The output thread checks the shutdown flag once per
//! device period. When it stops, it drops its end of the output and capture queues and the other
//! stages follow as their queues disconnect.

use crate::audio::backend::{self, Device};
use crate::audio::loopback::{self, ChannelRouter};
use crate::audio::mixer::{self, Input, Mixer, ReadMode};
use crate::audio::output::OutputConsumer;
use crate::audio::source::SourceBank;
use crate::audio::stats::Stats;
use crate::audio::{self, playback, CaptureReceiver};
use crate::error::{Error, Result};
use crossbeam::channel;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

/// Describes the pipeline to be spawned.
pub struct Pipeline {
    bank: SourceBank,
    frames_per_chunk: usize,
    queue_capacity: usize,
    prefill_chunks: usize,
    loopback: Option<ChannelRouter>,
    recording: bool,
}

/// A handle to the running pipeline.
///
/// Dropping the handle stops the pipeline in the same manner as `exit`.
pub struct Handle {
    shutdown: Arc<AtomicBool>,
    stats: Arc<Stats>,
    output: Option<thread::JoinHandle<Result<u64>>>,
    stages: Vec<thread::JoinHandle<()>>,
    recording_rx: Option<CaptureReceiver>,
}

impl Pipeline {
    /// A pipeline producing `frames_per_chunk` frames at a time from the given `bank`.
    pub fn new(bank: SourceBank, frames_per_chunk: usize) -> Result<Self> {
        if frames_per_chunk == 0 {
            return Err(Error::invalid("frames_per_chunk", "must be greater than 0"));
        }
        Ok(Pipeline {
            bank,
            frames_per_chunk,
            queue_capacity: audio::DEFAULT_QUEUE_CAPACITY,
            prefill_chunks: audio::DEFAULT_PREFILL_CHUNKS,
            loopback: None,
            recording: false,
        })
    }

    pub fn queue_capacity(mut self, capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(Error::invalid("queue_capacity", "must be greater than 0"));
        }
        self.queue_capacity = capacity;
        Ok(self)
    }

    pub fn prefill_chunks(mut self, chunks: usize) -> Self {
        self.prefill_chunks = chunks;
        self
    }

    /// Mix captured input into the output, routed by `router`.
    ///
    /// The router's output channel count must match the source bank's.
    pub fn loopback(mut self, router: ChannelRouter) -> Result<Self> {
        if router.channels_out() != self.bank.channels() {
            let reason = format!(
                "routes to {} channels but the pipeline has {}",
                router.channels_out(),
                self.bank.channels()
            );
            return Err(Error::invalid("loopback", reason));
        }
        self.loopback = Some(router);
        Ok(self)
    }

    /// Forward captured input to a recording queue available via `Handle::recording`.
    pub fn recording(mut self) -> Self {
        self.recording = true;
        self
    }

    /// Spawn every stage, with the output stage driving the given `device`.
    pub fn spawn<D>(self, mut device: D) -> Result<Handle>
    where
        D: Device + Send + 'static,
    {
        let Pipeline {
            bank,
            frames_per_chunk,
            queue_capacity,
            prefill_chunks,
            loopback,
            recording,
        } = self;
        let channels = bank.channels();
        let stats = Arc::new(Stats::new());
        let shutdown = Arc::new(AtomicBool::new(false));
        let mut stages = Vec::new();

        let (playback_tx, playback_rx) = channel::bounded(queue_capacity);
        let (output_tx, output_rx) = channel::bounded(queue_capacity);

        let mut mixer = Mixer::new(frames_per_chunk, channels, stats.clone());
        mixer.add_input(Input::new("playback", playback_rx, ReadMode::Blocking));
        let mut output = OutputConsumer::new(output_rx, channels, prefill_chunks, stats.clone());

        stages.push(spawn_stage("playback", move || {
            playback::run(bank, frames_per_chunk, playback_tx)
        })?);

        if let Some(router) = loopback {
            let (capture_tx, capture_rx) = channel::bounded(queue_capacity);
            let (loopback_tx, loopback_rx) = channel::bounded(queue_capacity);
            mixer.add_input(Input::new("loopback", loopback_rx, ReadMode::BestEffort));
            output = output.with_capture(capture_tx);
            stages.push(spawn_stage("loopback", move || {
                loopback::run(router, capture_rx, loopback_tx)
            })?);
        }

        let recording_rx = if recording {
            let (recording_tx, recording_rx) = channel::bounded(queue_capacity);
            output = output.with_recording(recording_tx);
            Some(recording_rx)
        } else {
            None
        };

        stages.push(spawn_stage("mixer", move || mixer::run(mixer, output_tx))?);

        let output_shutdown = shutdown.clone();
        let output = spawn_stage("output", move || {
            log::info!("output stage started");
            let result = backend::run(&mut device, &mut output, frames_per_chunk, &output_shutdown);
            match &result {
                Ok(periods) => log::info!("output stage stopped after {} periods", periods),
                Err(err) => log::error!("output stage stopped: {}", err),
            }
            result
        })?;

        Ok(Handle {
            shutdown,
            stats,
            output: Some(output),
            stages,
            recording_rx,
        })
    }
}

impl Handle {
    /// Counters for the anomalies absorbed by the running stages.
    pub fn stats(&self) -> &Arc<Stats> {
        &self.stats
    }

    /// The queue of raw captured input, if recording was enabled.
    pub fn recording(&self) -> Option<&CaptureReceiver> {
        self.recording_rx.as_ref()
    }

    /// Whether or not the output stage is still driving the device.
    pub fn is_running(&self) -> bool {
        self.output.as_ref().map(|h| !h.is_finished()).unwrap_or(false)
    }

    /// Stop every stage and wait for their threads to finish.
    ///
    /// Returns the number of device periods written, or the error that stopped the device.
    pub fn exit(mut self) -> Result<u64> {
        self.stop()
    }

    fn stop(&mut self) -> Result<u64> {
        self.shutdown.store(true, Ordering::Relaxed);
        let result = match self.output.take() {
            Some(output) => output
                .join()
                .unwrap_or_else(|_| Err(Error::Device("the output thread panicked".into()))),
            None => Ok(0),
        };
        // Disconnect the recording queue in case nobody is reading it.
        self.recording_rx.take();
        for stage in self.stages.drain(..) {
            let name = stage.thread().name().unwrap_or("unnamed").to_string();
            if stage.join().is_err() {
                log::error!("the `{}` thread panicked", name);
            }
        }
        result
    }
}

impl Drop for Handle {
    fn drop(&mut self) {
        if self.output.is_some() {
            self.stop().ok();
        }
    }
}

fn spawn_stage<F, T>(name: &'static str, f: F) -> Result<thread::JoinHandle<T>>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    thread::Builder::new()
        .name(name.into())
        .spawn(f)
        .map_err(|source| Error::Spawn { name, source })
}
