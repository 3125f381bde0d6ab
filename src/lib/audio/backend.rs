//! The device boundary.
//!
//! A pull-style `Device` captures input and blocks on write until it is ready for the next period.
//! `run` drives such a device with any `FrameProvider`. The `ClockedDevice` is a software device
//! paced by the system clock, able to render its output to a WAV file and to replay a WAV file as
//! its captured input.

use crate::audio::block::FrameBlock;
use crate::audio::output::FrameProvider;
use crate::audio::sample_stream::SampleStream;
use crate::audio::wav::{self, Wav};
use crate::error::{Error, Result};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

/// A device that is pulled from once per period.
pub trait Device {
    /// The raw little-endian input captured during the last period, if the device captures.
    fn capture(&mut self, n_frames: usize) -> Result<Option<Vec<u8>>>;

    /// Write a block to the device, blocking until it is ready for more.
    fn write(&mut self, block: &FrameBlock) -> Result<()>;

    /// Called once after the last write.
    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Drive the `device` with the `provider` one period of `n_frames` at a time until `shutdown`
/// is set.
///
/// Returns the number of periods written. Device errors end the loop.
pub fn run<D, P>(
    device: &mut D,
    provider: &mut P,
    n_frames: usize,
    shutdown: &AtomicBool,
) -> Result<u64>
where
    D: Device + ?Sized,
    P: FrameProvider + ?Sized,
{
    let mut periods = 0;
    while !shutdown.load(Ordering::Relaxed) {
        let captured = device.capture(n_frames)?;
        let block = provider.deliver(n_frames, captured.as_deref());
        device.write(&block)?;
        periods += 1;
    }
    device.finish()?;
    Ok(periods)
}

type WavWriter = hound::WavWriter<BufWriter<File>>;

/// A software device clocked by `std::time::Instant`.
pub struct ClockedDevice {
    sample_rate: u32,
    channels: usize,
    paced: bool,
    next_deadline: Option<Instant>,
    writer: Option<WavWriter>,
    capture: Option<CaptureLoop>,
}

// A WAV file replayed in a loop as captured input.
struct CaptureLoop {
    channels: usize,
    stream: SampleStream,
}

impl ClockedDevice {
    /// A device playing `channels` channels at `sample_rate`, paced to real time.
    pub fn new(sample_rate: u32, channels: usize) -> Result<Self> {
        if sample_rate == 0 {
            return Err(Error::invalid("sample_rate", "must be greater than 0"));
        }
        if channels == 0 {
            return Err(Error::InvalidChannelCount(channels));
        }
        Ok(ClockedDevice {
            sample_rate,
            channels,
            paced: true,
            next_deadline: None,
            writer: None,
            capture: None,
        })
    }

    /// Write as fast as the pipeline allows rather than at real time.
    pub fn unpaced(mut self) -> Self {
        self.paced = false;
        self
    }

    /// Render every written block to a 16-bit WAV file at `path`.
    pub fn with_wav_output(mut self, path: &Path) -> Result<Self> {
        let spec = wav::spec(self.channels, self.sample_rate);
        self.writer = Some(hound::WavWriter::create(path, spec)?);
        log::info!("rendering output to {}", path.display());
        Ok(self)
    }

    /// Replay the WAV at `path` in a loop as the device's captured input.
    pub fn with_capture_wav(mut self, path: &Path) -> Result<Self> {
        let wav = Wav::load(path, Some(self.sample_rate))?;
        let channels = wav.channels;
        if channels == 0 {
            return Err(Error::InvalidChannelCount(channels));
        }
        let stream = SampleStream::new(wav.samples)?;
        log::info!("capturing {} channels from {}", channels, path.display());
        self.capture = Some(CaptureLoop { channels, stream });
        Ok(self)
    }

    /// The number of channels captured per frame, if the device captures.
    pub fn capture_channels(&self) -> Option<usize> {
        self.capture.as_ref().map(|c| c.channels)
    }

    fn period(&self, n_frames: usize) -> Duration {
        Duration::from_secs_f64(n_frames as f64 / self.sample_rate as f64)
    }
}

impl Device for ClockedDevice {
    fn capture(&mut self, n_frames: usize) -> Result<Option<Vec<u8>>> {
        let capture = match self.capture {
            Some(ref mut capture) => capture,
            None => return Ok(None),
        };
        let samples = capture.stream.retrieve(n_frames * capture.channels);
        let bytes = samples.iter().flat_map(|s| s.to_le_bytes()).collect();
        Ok(Some(bytes))
    }

    fn write(&mut self, block: &FrameBlock) -> Result<()> {
        if block.channels() != self.channels {
            let msg = format!(
                "expected {} channels but got {}",
                self.channels,
                block.channels()
            );
            return Err(Error::Device(msg));
        }

        if let Some(ref mut writer) = self.writer {
            for &s in block.samples() {
                writer.write_sample(s)?;
            }
        }

        if self.paced {
            let now = Instant::now();
            let deadline = self.next_deadline.unwrap_or(now) + self.period(block.n_frames());
            if deadline > now {
                thread::sleep(deadline - now);
                self.next_deadline = Some(deadline);
            } else {
                // Fell behind by more than a period. Restart the clock rather than bursting.
                log::debug!("clocked device fell behind by {:?}", now - deadline);
                self.next_deadline = Some(now);
            }
        }
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        if let Some(writer) = self.writer.take() {
            writer.finalize()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Delivers an incrementing value and remembers the captures it was handed.
    struct Counter {
        value: i16,
        captured: Vec<Vec<u8>>,
    }

    impl FrameProvider for Counter {
        fn deliver(&mut self, n_frames: usize, captured: Option<&[u8]>) -> FrameBlock {
            self.value += 1;
            self.captured.extend(captured.map(|c| c.to_vec()));
            FrameBlock::from_interleaved(1, vec![self.value; n_frames]).unwrap()
        }
    }

    // Stops after a fixed number of writes.
    struct Limited<'a> {
        device: ClockedDevice,
        writes: usize,
        shutdown: &'a AtomicBool,
    }

    impl<'a> Device for Limited<'a> {
        fn capture(&mut self, n_frames: usize) -> Result<Option<Vec<u8>>> {
            self.device.capture(n_frames)
        }

        fn write(&mut self, block: &FrameBlock) -> Result<()> {
            self.device.write(block)?;
            self.writes -= 1;
            if self.writes == 0 {
                self.shutdown.store(true, Ordering::Relaxed);
            }
            Ok(())
        }

        fn finish(&mut self) -> Result<()> {
            self.device.finish()
        }
    }

    #[test]
    fn renders_to_wav() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.wav");
        let shutdown = AtomicBool::new(false);
        let device = ClockedDevice::new(1_000, 1)
            .unwrap()
            .unpaced()
            .with_wav_output(&path)
            .unwrap();
        let mut device = Limited {
            device,
            writes: 3,
            shutdown: &shutdown,
        };
        let mut provider = Counter {
            value: 0,
            captured: vec![],
        };
        let periods = run(&mut device, &mut provider, 2, &shutdown).unwrap();
        assert_eq!(periods, 3);
        assert!(provider.captured.is_empty());
        let wav = Wav::load(&path, Some(1_000)).unwrap();
        assert_eq!(wav.samples, vec![1, 1, 2, 2, 3, 3]);
    }

    #[test]
    fn replays_capture_in_a_loop() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("in.wav");
        wav::write(&path, 2, 1_000, &[1, -1, 2, -2]).unwrap();
        let mut device = ClockedDevice::new(1_000, 2)
            .unwrap()
            .unpaced()
            .with_capture_wav(&path)
            .unwrap();
        assert_eq!(device.capture_channels(), Some(2));
        let bytes = device.capture(3).unwrap().unwrap();
        let block = FrameBlock::from_le_bytes(2, &bytes).unwrap();
        assert_eq!(block.samples(), &[1, -1, 2, -2, 1, -1]);
    }

    #[test]
    fn paced_to_real_time() {
        let mut device = ClockedDevice::new(1_000, 1).unwrap();
        let block = FrameBlock::silent(20, 1);
        let start = Instant::now();
        for _ in 0..5 {
            device.write(&block).unwrap();
        }
        // Five 20ms periods.
        assert!(start.elapsed() >= Duration::from_millis(90));
    }

    #[test]
    fn rejects_wrong_shape() {
        let mut device = ClockedDevice::new(1_000, 2).unwrap().unpaced();
        assert!(device.write(&FrameBlock::silent(4, 1)).is_err());
        assert!(ClockedDevice::new(0, 2).is_err());
        assert!(ClockedDevice::new(1_000, 0).is_err());
    }
}
