use crossbeam::channel;

pub use self::block::FrameBlock;
pub use self::output::{FrameProvider, OutputConsumer};
pub use self::sample_stream::SampleStream;
pub use self::source::{Source, SourceBank};
pub use self::stats::Stats;
pub use self::wav::Wav;

pub mod backend;
pub mod block;
pub mod loopback;
pub mod mixer;
pub mod output;
pub mod playback;
pub mod rbf;
pub mod sample_stream;
pub mod source;
pub mod stats;
pub mod wav;

/// The sample rate of the output stream.
pub const DEFAULT_SAMPLE_RATE: u32 = 44_100;

/// The number of frames produced per chunk by the playback producer.
pub const DEFAULT_FRAMES_PER_CHUNK: usize = 1_024;

/// The capacity of every queue between pipeline stages, in chunks.
pub const DEFAULT_QUEUE_CAPACITY: usize = 100;

/// The number of silent periods the output serves before draining the mixer.
pub const DEFAULT_PREFILL_CHUNKS: usize = 10;

/// The master volume applied to the sum of all sources.
pub const DEFAULT_MASTER_VOLUME: f32 = 1.0;

/// The sending end of a queue of blocks between two stages.
pub type BlockSender = channel::Sender<FrameBlock>;
/// The receiving end of a queue of blocks between two stages.
pub type BlockReceiver = channel::Receiver<FrameBlock>;

/// The sending end of a queue of raw captured input.
pub type CaptureSender = channel::Sender<Vec<u8>>;
/// The receiving end of a queue of raw captured input.
pub type CaptureReceiver = channel::Receiver<Vec<u8>>;
