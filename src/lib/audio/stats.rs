//! Counters for the anomalies the real-time stages absorb rather than report as errors.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Lock-free counters shared between the pipeline stages and whoever is monitoring them.
#[derive(Debug, Default)]
pub struct Stats {
    underruns: AtomicU64,
    missing_inputs: AtomicU64,
    dropped_captures: AtomicU64,
    blocks_delivered: AtomicU64,
}

/// A point-in-time copy of the `Stats` counters.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Snapshot {
    /// Device periods that could not be fully served from the output queue.
    pub underruns: u64,
    /// Mixer ticks where a best-effort input had no block ready.
    pub missing_inputs: u64,
    /// Captured buffers dropped because a capture queue was full.
    pub dropped_captures: u64,
    /// Blocks handed to the device, including prefill.
    pub blocks_delivered: u64,
}

impl Stats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn underruns(&self) -> u64 {
        self.underruns.load(Ordering::Relaxed)
    }

    pub fn missing_inputs(&self) -> u64 {
        self.missing_inputs.load(Ordering::Relaxed)
    }

    pub fn dropped_captures(&self) -> u64 {
        self.dropped_captures.load(Ordering::Relaxed)
    }

    pub fn blocks_delivered(&self) -> u64 {
        self.blocks_delivered.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            underruns: self.underruns(),
            missing_inputs: self.missing_inputs(),
            dropped_captures: self.dropped_captures(),
            blocks_delivered: self.blocks_delivered(),
        }
    }

    pub(crate) fn count_underrun(&self) {
        self.underruns.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn count_missing_input(&self) {
        self.missing_inputs.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn count_dropped_capture(&self) {
        self.dropped_captures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn count_delivered(&self) {
        self.blocks_delivered.fetch_add(1, Ordering::Relaxed);
    }
}

impl fmt::Display for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "delivered: {}, underruns: {}, missing inputs: {}, dropped captures: {}",
            self.blocks_delivered, self.underruns, self.missing_inputs, self.dropped_captures
        )
    }
}

#[test]
fn snapshot_reflects_counts() {
    let stats = Stats::new();
    stats.count_underrun();
    stats.count_underrun();
    stats.count_missing_input();
    stats.count_delivered();
    let snapshot = stats.snapshot();
    assert_eq!(snapshot.underruns, 2);
    assert_eq!(snapshot.missing_inputs, 1);
    assert_eq!(snapshot.dropped_captures, 0);
    assert_eq!(snapshot.blocks_delivered, 1);
}
