use hive_audio::audio::backend::Device;
use hive_audio::audio::loopback::ChannelRouter;
use hive_audio::audio::{wav, FrameBlock, Source, SourceBank};
use hive_audio::config::Config;
use hive_audio::error::Result;
use hive_audio::pipeline::Pipeline;
use hive_audio::Samples;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

const TIMEOUT: Duration = Duration::from_secs(10);

struct Constant(i16);

impl Source for Constant {
    fn produce_into(&mut self, out: &mut [f32], _n_frames: usize, _n_channels: usize) {
        for sample in out {
            *sample += self.0 as f32;
        }
    }
}

// Keeps the first blocks written to it and optionally captures a fixed stereo frame.
struct Recorder {
    written: Arc<Mutex<Vec<FrameBlock>>>,
    capture: Option<(i16, i16)>,
}

impl Device for Recorder {
    fn capture(&mut self, n_frames: usize) -> Result<Option<Vec<u8>>> {
        Ok(self.capture.map(|(l, r)| {
            let frame: Vec<u8> = l.to_le_bytes().into_iter().chain(r.to_le_bytes()).collect();
            frame.repeat(n_frames)
        }))
    }

    fn write(&mut self, block: &FrameBlock) -> Result<()> {
        let mut written = self.written.lock().unwrap();
        if written.len() < 1_000 {
            written.push(block.clone());
        }
        drop(written);
        thread::sleep(Duration::from_millis(1));
        Ok(())
    }
}

fn recorder(capture: Option<(i16, i16)>) -> (Recorder, Arc<Mutex<Vec<FrameBlock>>>) {
    let written = Arc::new(Mutex::new(Vec::new()));
    let recorder = Recorder {
        written: written.clone(),
        capture,
    };
    (recorder, written)
}

// Wait until `written` contains a block satisfying `f`.
fn wait_for<F>(written: &Mutex<Vec<FrameBlock>>, f: F)
where
    F: Fn(&FrameBlock) -> bool,
{
    let start = Instant::now();
    while !written.lock().unwrap().iter().any(&f) {
        assert!(start.elapsed() < TIMEOUT, "timed out waiting for audio");
        thread::sleep(Duration::from_millis(5));
    }
}

#[test]
fn sources_reach_the_device_after_prefill() {
    let mut bank = SourceBank::new(2, 1.0).unwrap();
    bank.add(Constant(100));
    bank.add(Constant(50));
    let (device, written) = recorder(None);
    let handle = Pipeline::new(bank, 64)
        .unwrap()
        .queue_capacity(4)
        .unwrap()
        .prefill_chunks(3)
        .spawn(device)
        .unwrap();

    wait_for(&written, |b| b.samples().iter().all(|&s| s == 150));
    let stats = handle.stats().clone();
    let periods = handle.exit().unwrap();

    let written = written.lock().unwrap();
    assert!(written[..3].iter().all(|b| b.is_silent()));
    for block in written.iter() {
        assert_eq!(block.n_frames(), 64);
        assert_eq!(block.channels(), 2);
        assert!(block.samples().iter().all(|&s| s == 0 || s == 150));
    }
    assert!(periods >= written.len() as u64);
    assert_eq!(stats.blocks_delivered(), periods);
}

#[test]
fn captured_input_is_looped_back_and_recorded() {
    let bank = SourceBank::new(4, 1.0).unwrap();
    let (device, written) = recorder(Some((1_000, -1_000)));
    let handle = Pipeline::new(bank, 32)
        .unwrap()
        .prefill_chunks(0)
        .loopback(ChannelRouter::new(2, 4).unwrap())
        .unwrap()
        .recording()
        .spawn(device)
        .unwrap();

    wait_for(&written, |b| {
        b.frames().all(|f| f == [1_000, 1_000, -1_000, -1_000])
    });
    let recorded = handle.recording().unwrap().recv_timeout(TIMEOUT).unwrap();
    assert_eq!(recorded.len(), 32 * 2 * 2);
    assert_eq!(&recorded[..4], &[0xE8, 0x03, 0x18, 0xFC]);
    handle.exit().unwrap();
}

#[test]
fn loopback_must_match_the_output_channels() {
    let bank = SourceBank::new(2, 1.0).unwrap();
    let router = ChannelRouter::new(2, 4).unwrap();
    assert!(Pipeline::new(bank, 32).unwrap().loopback(router).is_err());
}

#[test]
fn exit_stops_every_stage() {
    let mut bank = SourceBank::new(1, 1.0).unwrap();
    bank.add(Constant(1));
    let (device, written) = recorder(Some((0, 0)));
    let handle = Pipeline::new(bank, 16)
        .unwrap()
        .queue_capacity(1)
        .unwrap()
        .loopback(ChannelRouter::new(2, 1).unwrap())
        .unwrap()
        .spawn(device)
        .unwrap();
    assert!(handle.is_running());
    wait_for(&written, |b| !b.is_silent());
    // Returns only once every stage thread has been joined.
    handle.exit().unwrap();
}

#[test]
fn render_a_swarm_to_wav() {
    let dir = tempfile::tempdir().unwrap();
    let samples_dir = dir.path().join("samples");
    std::fs::create_dir(&samples_dir).unwrap();
    wav::write(&samples_dir.join("hum.wav"), 1, 1_000, &[8_000; 250]).unwrap();
    let output = dir.path().join("out.wav");

    let mut config = Config::default();
    config.sample_rate = 1_000;
    config.frames_per_chunk = 50;
    config.prefill_chunks = 2;
    config.swarm_speed = 1.0;
    config.swarm_samples = Some(samples_dir);
    config.output_wav = Some(output.clone());

    let samples = Samples::load(&config).unwrap();
    assert_eq!(samples.swarm.len(), 1);
    let device = hive_audio::clocked_device(&config).unwrap();
    let handle = hive_audio::spawn(&config, samples, device).unwrap();
    thread::sleep(Duration::from_millis(600));
    let periods = handle.exit().unwrap();
    assert!(periods > 2);

    let rendered = wav::Wav::load(&output, Some(1_000)).unwrap();
    assert_eq!(rendered.channels, 2);
    assert_eq!(rendered.n_frames() as u64, periods * 50);
    // The prefill is silent and the swarm is audible once playback begins.
    assert!(rendered.samples[..200].iter().all(|&s| s == 0));
    assert!(rendered.samples.iter().any(|&s| s != 0));
}
