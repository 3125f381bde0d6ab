//! Hive gains from a radial-basis-function kernel over the distance between the swarm and each
//! hive.
//!
//! The gain for a hive at distance `d` is `exp(-gamma * d²)`. It is exactly `1` when the swarm is
//! at the hive and decays smoothly toward `0` as the swarm moves away.

use crate::metres::Point2;
use cgmath::MetricSpace;

/// The default kernel width parameter.
pub const DEFAULT_GAMMA: f64 = 1.0;

/// Maps swarm positions to a gain per hive.
///
/// Holds no state beyond `gamma`, so a single mapper may be shared between any number of
/// sources.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct VolumeMapper {
    pub gamma: f64,
}

/// An iterator yielding the gain of each hive for a single position.
#[derive(Clone)]
pub struct HiveGains<'a> {
    hives: std::slice::Iter<'a, Point2>,
    position: Point2,
    gamma: f64,
}

impl VolumeMapper {
    pub fn new(gamma: f64) -> Self {
        VolumeMapper { gamma }
    }

    /// The gain for each of the given hives with the swarm at `position`.
    pub fn hive_gains<'a>(&self, hives: &'a [Point2], position: Point2) -> HiveGains<'a> {
        HiveGains {
            hives: hives.iter(),
            position,
            gamma: self.gamma,
        }
    }

    /// Produce the row-major `positions.len() × hives.len()` matrix of gains.
    ///
    /// Entry `(i, j)` is the gain of hive `j` with the swarm at `positions[i]`.
    pub fn volumes(&self, hives: &[Point2], positions: &[Point2]) -> Vec<f64> {
        let mut volumes = Vec::with_capacity(hives.len() * positions.len());
        for &position in positions {
            volumes.extend(self.hive_gains(hives, position));
        }
        volumes
    }
}

impl Default for VolumeMapper {
    fn default() -> Self {
        VolumeMapper::new(DEFAULT_GAMMA)
    }
}

impl<'a> Iterator for HiveGains<'a> {
    type Item = f64;
    fn next(&mut self) -> Option<Self::Item> {
        self.hives
            .next()
            .map(|hive| gain(self.gamma, hive.distance2(self.position)))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.hives.size_hint()
    }
}

impl<'a> ExactSizeIterator for HiveGains<'a> {}

/// The kernel value for the given squared distance.
pub fn gain(gamma: f64, distance_2: f64) -> f64 {
    (-gamma * distance_2).exp()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metres::pt2;
    use rand::{Rng, SeedableRng};

    #[test]
    fn unit_gain_at_hive() {
        let hives = vec![pt2(0.0, 0.0), pt2(1.0, 1.0), pt2(-2.0, 0.5)];
        let mapper = VolumeMapper::default();
        let volumes = mapper.volumes(&hives, &hives);
        for i in 0..hives.len() {
            assert_eq!(volumes[i * hives.len() + i], 1.0);
        }
        // Off the diagonal every gain is strictly less than one.
        for i in 0..hives.len() {
            for j in (0..hives.len()).filter(|&j| j != i) {
                assert!(volumes[i * hives.len() + j] < 1.0);
            }
        }
    }

    #[test]
    fn gains_are_bounded() {
        let mut rng = rand::rngs::StdRng::seed_from_u64(7);
        let hives: Vec<_> = (0..6).map(|_| pt2(rng.gen(), rng.gen())).collect();
        let positions: Vec<_> = (0..100).map(|_| pt2(rng.gen(), rng.gen())).collect();
        for &gamma in &[0.1, 1.0, 50.0] {
            let volumes = VolumeMapper::new(gamma).volumes(&hives, &positions);
            assert_eq!(volumes.len(), 600);
            assert!(volumes.iter().all(|&v| v > 0.0 && v <= 1.0));
        }
    }

    #[test]
    fn gain_decreases_with_distance() {
        let hives = [pt2(0.0, 0.0)];
        let mapper = VolumeMapper::new(1.0);
        let near = mapper.hive_gains(&hives, pt2(0.5, 0.0)).next().unwrap();
        let far = mapper.hive_gains(&hives, pt2(1.5, 0.0)).next().unwrap();
        approx::assert_relative_eq!(near, (-0.25f64).exp());
        assert!(far < near);
    }
}
