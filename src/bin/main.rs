use anyhow::Context;
use clap::Parser;
use hive_audio::config::{self, Config};
use hive_audio::{utils, Samples};
use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};

#[derive(Parser)]
#[command(name = "hive_audio")]
#[command(about = "Swarm audio engine for an installation of hives", long_about = None)]
struct Cli {
    /// Path to the TOML config. Defaults are used for anything it omits.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory of looping samples carried around the hives by the swarm
    #[arg(long)]
    swarm_samples: Option<PathBuf>,

    /// Directory of clips played occasionally through a random hive
    #[arg(long)]
    occasional_samples: Option<PathBuf>,

    /// Render the output to this WAV file
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Replay this stereo WAV file as captured input and loop it back
    #[arg(long)]
    capture: Option<PathBuf>,

    /// Number of output channels (one hive per channel)
    #[arg(short = 'n', long)]
    channels: Option<usize>,

    /// Seed for every random number generator
    #[arg(long)]
    seed: Option<u64>,

    /// Stop after this many seconds. Runs until killed otherwise.
    #[arg(short, long)]
    duration: Option<f64>,

    /// Seconds between logging pipeline stats
    #[arg(long, default_value = "10.0")]
    stats_interval: f64,
}

impl Cli {
    fn config(&self) -> anyhow::Result<Config> {
        let mut config = match self.config {
            Some(ref path) => config::load(path)
                .with_context(|| format!("failed to load config from {}", path.display()))?,
            None => Config::default(),
        };
        if let Some(ref dir) = self.swarm_samples {
            config.swarm_samples = Some(dir.clone());
        }
        if let Some(ref dir) = self.occasional_samples {
            config.occasional_samples = Some(dir.clone());
        }
        if let Some(ref path) = self.output {
            config.output_wav = Some(path.clone());
        }
        if let Some(ref path) = self.capture {
            config.capture_wav = Some(path.clone());
            config.loopback = true;
        }
        if let Some(channels) = self.channels {
            config.n_channels = channels;
        }
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        config.validate().context("invalid config")?;
        Ok(config)
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let cli = Cli::parse();
    let config = cli.config()?;
    log::info!(
        "{} channels at {}Hz, {} frames per chunk",
        config.n_channels,
        config.sample_rate,
        config.frames_per_chunk
    );

    let samples = Samples::load(&config).context("failed to load samples")?;
    let device = hive_audio::clocked_device(&config).context("failed to open the device")?;
    let handle = hive_audio::spawn(&config, samples, device).context("failed to start")?;

    let stop_at = cli.duration.map(|secs| Instant::now() + Duration::from_secs_f64(secs.max(0.0)));
    let stats_interval = Duration::from_secs_f64(cli.stats_interval.max(0.1));
    let mut next_stats = Instant::now() + stats_interval;
    while handle.is_running() {
        let now = Instant::now();
        if stop_at.map(|t| now >= t).unwrap_or(false) {
            break;
        }
        if now >= next_stats {
            log::info!("{}", handle.stats().snapshot());
            next_stats += stats_interval;
        }
        thread::sleep(Duration::from_millis(50));
    }

    let stats = handle.stats().clone();
    let periods = handle.exit().context("the output device failed")?;
    let frames = periods as usize * config.frames_per_chunk;
    let secs = utils::frames_to_secs(frames, config.sample_rate);
    log::info!("wrote {:.1}s of audio; {}", secs, stats.snapshot());
    Ok(())
}
