use crate::audio::rbf::VolumeMapper;
use crate::error::{Error, Result};
use crate::hive::{self, Hive};
use crate::metres::Metres;
use crate::swarm;
use crate::utils::{self, Seed};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Various configuration parameters for the installation loaded on startup.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default = "default::n_channels")]
    pub n_channels: usize,
    #[serde(default = "default::sample_rate")]
    pub sample_rate: u32,
    #[serde(default = "default::frames_per_chunk")]
    pub frames_per_chunk: usize,
    #[serde(default = "default::master_volume")]
    pub master_volume: f32,
    /// Radius of the circle of hives used when no `hives` are listed.
    #[serde(default = "default::hive_radius")]
    pub hive_radius: Metres,
    /// Explicit hive locations in channel order.
    #[serde(default)]
    pub hives: Option<Vec<Hive>>,
    /// Metres per second.
    #[serde(default = "default::swarm_speed")]
    pub swarm_speed: f64,
    #[serde(default = "default::swarm_volume")]
    pub swarm_volume: f32,
    #[serde(default = "default::gamma")]
    pub gamma: f64,
    #[serde(default = "default::linger_secs")]
    pub linger_secs: f64,
    #[serde(default = "default::p_change_direction")]
    pub p_change_direction: f64,
    #[serde(default = "default::p_jump_hives")]
    pub p_jump_hives: f64,
    /// Seconds between plays of the occasional clips.
    #[serde(default = "default::repeat_period")]
    pub repeat_period: f64,
    #[serde(default = "default::occasional_volume")]
    pub occasional_volume: f32,
    #[serde(default = "default::queue_capacity")]
    pub queue_capacity: usize,
    #[serde(default = "default::prefill_chunks")]
    pub prefill_chunks: usize,
    /// Mix captured input into the output.
    #[serde(default)]
    pub loopback: bool,
    #[serde(default = "default::capture_channels")]
    pub capture_channels: usize,
    #[serde(default)]
    pub seed: Seed,
    /// Directory of looping samples, each carried around the hives by its own swarm.
    #[serde(default)]
    pub swarm_samples: Option<PathBuf>,
    /// Directory of clips played occasionally through a random hive.
    #[serde(default)]
    pub occasional_samples: Option<PathBuf>,
    /// Render the output to this WAV file.
    #[serde(default)]
    pub output_wav: Option<PathBuf>,
    /// Replay this WAV file as captured input.
    #[serde(default)]
    pub capture_wav: Option<PathBuf>,
}

// Fallback parameters in the case that they are missing from the file.
pub mod default {
    use crate::audio;
    use crate::audio::rbf;
    use crate::audio::source::occasional;
    use crate::metres::Metres;
    use crate::swarm;
    pub fn n_channels() -> usize { 2 }
    pub fn sample_rate() -> u32 { audio::DEFAULT_SAMPLE_RATE }
    pub fn frames_per_chunk() -> usize { audio::DEFAULT_FRAMES_PER_CHUNK }
    pub fn master_volume() -> f32 { audio::DEFAULT_MASTER_VOLUME }
    pub fn hive_radius() -> Metres { 3.0 }
    pub fn swarm_speed() -> f64 { 0.1 }
    pub fn swarm_volume() -> f32 { 1.0 }
    pub fn gamma() -> f64 { rbf::DEFAULT_GAMMA }
    pub fn linger_secs() -> f64 { swarm::DEFAULT_LINGER_SECS }
    pub fn p_change_direction() -> f64 { swarm::DEFAULT_P_CHANGE_DIRECTION }
    pub fn p_jump_hives() -> f64 { swarm::DEFAULT_P_JUMP_HIVES }
    pub fn repeat_period() -> f64 { occasional::DEFAULT_REPEAT_PERIOD_SECS }
    pub fn occasional_volume() -> f32 { 1.0 }
    pub fn queue_capacity() -> usize { audio::DEFAULT_QUEUE_CAPACITY }
    pub fn prefill_chunks() -> usize { audio::DEFAULT_PREFILL_CHUNKS }
    pub fn capture_channels() -> usize { 2 }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            n_channels: default::n_channels(),
            sample_rate: default::sample_rate(),
            frames_per_chunk: default::frames_per_chunk(),
            master_volume: default::master_volume(),
            hive_radius: default::hive_radius(),
            hives: None,
            swarm_speed: default::swarm_speed(),
            swarm_volume: default::swarm_volume(),
            gamma: default::gamma(),
            linger_secs: default::linger_secs(),
            p_change_direction: default::p_change_direction(),
            p_jump_hives: default::p_jump_hives(),
            repeat_period: default::repeat_period(),
            occasional_volume: default::occasional_volume(),
            queue_capacity: default::queue_capacity(),
            prefill_chunks: default::prefill_chunks(),
            loopback: false,
            capture_channels: default::capture_channels(),
            seed: 0,
            swarm_samples: None,
            occasional_samples: None,
            output_wav: None,
            capture_wav: None,
        }
    }
}

impl Config {
    /// Check every parameter before anything is built from it.
    pub fn validate(&self) -> Result<()> {
        if self.n_channels == 0 {
            return Err(Error::InvalidChannelCount(self.n_channels));
        }
        if self.frames_per_chunk == 0 {
            return Err(Error::invalid("frames_per_chunk", "must be greater than 0"));
        }
        if self.queue_capacity == 0 {
            return Err(Error::invalid("queue_capacity", "must be greater than 0"));
        }
        non_negative("master_volume", self.master_volume as f64)?;
        non_negative("repeat_period", self.repeat_period)?;
        if !(self.gamma.is_finite() && self.gamma > 0.0) {
            return Err(Error::invalid("gamma", format!("{} must be > 0", self.gamma)));
        }
        match self.hives {
            Some(ref hives) if hives.is_empty() => {
                return Err(Error::invalid("hives", "at least one hive is required"));
            }
            Some(ref hives) if hives.len() > self.n_channels => {
                let reason = format!(
                    "{} hives listed but only {} channels",
                    hives.len(),
                    self.n_channels
                );
                return Err(Error::invalid("hives", reason));
            }
            _ => (),
        }
        if self.loopback && self.capture_channels != 2 {
            return Err(Error::LoopbackInputChannels(self.capture_channels));
        }
        self.swarm_params().validate()
    }

    /// The hives in channel order, either those listed or a circle of one hive per channel.
    pub fn hives(&self) -> Vec<Hive> {
        match self.hives {
            Some(ref hives) => hives.clone(),
            None => hive::circle(self.n_channels, self.hive_radius),
        }
    }

    pub fn swarm_params(&self) -> swarm::Params {
        swarm::Params {
            speed: self.swarm_speed,
            sample_rate: self.sample_rate,
            linger_secs: self.linger_secs,
            p_change_direction: self.p_change_direction,
            p_jump_hives: self.p_jump_hives,
        }
    }

    pub fn volume_mapper(&self) -> VolumeMapper {
        VolumeMapper { gamma: self.gamma }
    }

    /// The seed for the `n`th consumer of randomness.
    pub fn seed_for(&self, n: u64) -> Seed {
        utils::derive_seed(self.seed, n)
    }
}

fn non_negative(name: &'static str, value: f64) -> Result<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(Error::invalid(name, format!("{} must be >= 0", value)))
    }
}

/// Load the `Config` from the toml file at the given path.
pub fn load(path: &Path) -> Result<Config> {
    utils::load_from_toml(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metres::pt2;

    #[test]
    fn empty_file_gives_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.sample_rate, 44_100);
        assert_eq!(config.frames_per_chunk, 1_024);
        assert_eq!(config.queue_capacity, 100);
        assert_eq!(config.prefill_chunks, 10);
        assert_eq!(config.repeat_period, 600.0);
        assert!(config.validate().is_ok());
        assert_eq!(config.hives().len(), 2);
    }

    #[test]
    fn explicit_hives() {
        let toml = r#"
            n_channels = 4
            swarm_speed = 0.5
            loopback = true

            [[hives]]
            name = "north"
            point = { x = 0.0, y = 1.0 }

            [[hives]]
            name = "south"
            point = { x = 0.0, y = -1.0 }
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        config.validate().unwrap();
        let hives = config.hives();
        assert_eq!(hives.len(), 2);
        assert_eq!(hives[0].name, "north");
        assert_eq!(hives[1].point, pt2(0.0, -1.0));
        assert_eq!(config.swarm_params().speed, 0.5);
    }

    #[test]
    fn invalid_values() {
        let check = |f: &dyn Fn(&mut Config)| {
            let mut config = Config::default();
            f(&mut config);
            config.validate()
        };
        assert!(check(&|c| c.n_channels = 0).is_err());
        assert!(check(&|c| c.frames_per_chunk = 0).is_err());
        assert!(check(&|c| c.queue_capacity = 0).is_err());
        assert!(check(&|c| c.swarm_speed = 0.0).is_err());
        assert!(check(&|c| c.p_jump_hives = 1.5).is_err());
        assert!(check(&|c| c.gamma = -1.0).is_err());
        assert!(check(&|c| c.hives = Some(vec![])).is_err());
        assert!(check(&|c| {
            c.loopback = true;
            c.capture_channels = 1;
        })
        .is_err());
        assert!(check(&|c| {
            c.n_channels = 1;
            c.hives = Some(hive::circle(2, 1.0));
        })
        .is_err());
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "n_channels = 12\nseed = 7\n").unwrap();
        let config = load(&path).unwrap();
        assert_eq!(config.n_channels, 12);
        assert_eq!(config.hives().len(), 12);
        assert_ne!(config.seed_for(0), config.seed_for(1));

        std::fs::write(&path, "n_channels = \"twelve\"").unwrap();
        assert!(matches!(load(&path), Err(Error::Toml(_))));
    }
}
