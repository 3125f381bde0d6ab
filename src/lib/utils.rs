use crate::error::Result;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::fs;
use std::path::Path;
use time_calc::{SampleHz, Samples};

pub const SEC_MS: f64 = 1_000.0;

/// The type used to seed the `StdRng`s owned by each swarm and source.
pub type Seed = u64;

/// Derive a distinct seed for the `n`th consumer of randomness from a single base seed.
///
/// Sums in a wrapping manner so that every source gets its own reproducible stream.
pub fn derive_seed(base: Seed, n: u64) -> Seed {
    base.wrapping_add(n.wrapping_mul(0x9E37_79B9_7F4A_7C15))
}

/// Create a reproducible random number generator from the given seed.
pub fn rng(seed: Seed) -> StdRng {
    StdRng::seed_from_u64(seed)
}

/// The number of whole frames in the given duration at the given rate.
///
/// Negative or non-finite durations produce `0`.
pub fn secs_to_frames(secs: f64, sample_rate: u32) -> usize {
    let frames = secs * sample_rate as f64;
    if frames.is_finite() && frames > 0.0 {
        frames.round() as usize
    } else {
        0
    }
}

/// The duration of the given number of frames in seconds.
pub fn frames_to_secs(frames: usize, sample_rate: u32) -> f64 {
    let ms = Samples(frames as _).to_ms(sample_rate as SampleHz);
    ms.ms() / SEC_MS
}

/// A generic function for loading a type from a TOML file.
pub fn load_from_toml<T>(toml_path: &Path) -> Result<T>
where
    T: for<'de> serde::Deserialize<'de>,
{
    let contents = fs::read_to_string(toml_path)?;
    let t = toml::from_str(&contents)?;
    Ok(t)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn secs_to_frames_rounds_and_clamps() {
        assert_eq!(secs_to_frames(3.0, 1024), 3072);
        assert_eq!(secs_to_frames(1.0, 44_100), 44_100);
        assert_eq!(secs_to_frames(-1.0, 44_100), 0);
        assert_eq!(secs_to_frames(f64::NAN, 44_100), 0);
    }

    #[test]
    fn frames_to_secs_at_the_sample_rate() {
        assert_eq!(frames_to_secs(22_050, 44_100), 0.5);
        assert_eq!(frames_to_secs(3 * 1024, 1024), 3.0);
        assert_eq!(frames_to_secs(0, 44_100), 0.0);
    }

    #[test]
    fn derived_seeds_differ() {
        let base = 42;
        assert_ne!(derive_seed(base, 0), derive_seed(base, 1));
        assert_eq!(derive_seed(base, 0), base);
    }
}
