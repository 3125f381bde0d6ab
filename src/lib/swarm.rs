//! The swarm: a simulated sound source travelling between hives.
//!
//! The swarm alternates between two states:
//!
//! - **Moving**: travelling in a straight line toward the destination hive at a constant speed.
//! - **Lingering**: stationary at the hive it most recently reached, for a number of frames.
//!
//! On reaching a hive the swarm picks its next destination. Usually this is the neighbouring hive
//! in the current direction of travel, but occasionally the direction reverses or the swarm jumps
//! to a hive chosen at random.

use crate::error::{Error, Result};
use crate::metres::{Metres, Point2, Vector2};
use crate::utils;
use cgmath::{InnerSpace, MetricSpace};
use rand::rngs::StdRng;
use rand::Rng;

/// The default probability of reversing direction on arrival.
pub const DEFAULT_P_CHANGE_DIRECTION: f64 = 0.2;
/// The default probability of jumping to a random hive on arrival.
pub const DEFAULT_P_JUMP_HIVES: f64 = 0.1;
/// The default duration for which the swarm rests at a hive.
pub const DEFAULT_LINGER_SECS: f64 = 3.0;

/// Parameters describing how the swarm moves.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Params {
    /// Travel speed in metres per second.
    pub speed: f64,
    /// The rate at which positions are sampled.
    pub sample_rate: u32,
    /// Seconds spent at each hive on arrival.
    pub linger_secs: f64,
    pub p_change_direction: f64,
    pub p_jump_hives: f64,
}

/// Movement state that is updated during each call to `advance`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct State {
    /// The current location of the swarm.
    pub position: Point2,
    /// The index of the hive toward which the swarm is travelling.
    pub destination: usize,
    /// The direction of travel around the hive ring, either `1` or `-1`.
    pub direction: isize,
    /// The number of frames left to remain stationary.
    pub linger_frames: usize,
}

/// Simulates the position of the swarm, one frame at a time.
#[derive(Debug)]
pub struct Swarm {
    hives: Vec<Point2>,
    // Distance travelled per frame.
    step: Metres,
    linger_frames: usize,
    p_change_direction: f64,
    p_jump_hives: f64,
    state: State,
    rng: StdRng,
}

impl Params {
    pub fn new(speed: f64, sample_rate: u32) -> Self {
        Params {
            speed,
            sample_rate,
            linger_secs: DEFAULT_LINGER_SECS,
            p_change_direction: DEFAULT_P_CHANGE_DIRECTION,
            p_jump_hives: DEFAULT_P_JUMP_HIVES,
        }
    }

    /// Check that each parameter lies within its valid range.
    pub fn validate(&self) -> Result<()> {
        if !(self.speed.is_finite() && self.speed > 0.0) {
            return Err(Error::invalid("swarm_speed", format!("{} must be > 0", self.speed)));
        }
        if self.sample_rate == 0 {
            return Err(Error::invalid("sample_rate", "must be > 0"));
        }
        if !(self.linger_secs.is_finite() && self.linger_secs >= 0.0) {
            let reason = format!("{} must be >= 0", self.linger_secs);
            return Err(Error::invalid("linger_secs", reason));
        }
        check_probability("p_change_direction", self.p_change_direction)?;
        check_probability("p_jump_hives", self.p_jump_hives)?;
        Ok(())
    }
}

impl Swarm {
    /// Create a swarm resting at the first hive, heading for the second.
    ///
    /// Returns an error if `hives` is empty or any parameter is out of range.
    pub fn new(hives: Vec<Point2>, params: Params, rng: StdRng) -> Result<Self> {
        if hives.is_empty() {
            return Err(Error::invalid("hives", "at least one hive is required"));
        }
        if hives.iter().any(|h| !(h.x.is_finite() && h.y.is_finite())) {
            return Err(Error::invalid("hives", "hive coordinates must be finite"));
        }
        params.validate()?;
        let step = params.speed / params.sample_rate as f64;
        let linger_frames = utils::secs_to_frames(params.linger_secs, params.sample_rate);
        let state = State {
            position: hives[0],
            destination: 1 % hives.len(),
            direction: 1,
            linger_frames: 0,
        };
        Ok(Swarm {
            hives,
            step,
            linger_frames,
            p_change_direction: params.p_change_direction,
            p_jump_hives: params.p_jump_hives,
            state,
            rng,
        })
    }

    /// The hive locations in channel order.
    pub fn hives(&self) -> &[Point2] {
        &self.hives
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    /// The distance travelled per frame, which doubles as the arrival tolerance.
    pub fn step(&self) -> Metres {
        self.step
    }

    pub fn is_lingering(&self) -> bool {
        self.state.linger_frames > 0
    }

    /// Produce the position of the swarm for each of the next `n_frames` frames.
    pub fn advance(&mut self, n_frames: usize) -> Vec<Point2> {
        let mut positions = Vec::with_capacity(n_frames);
        self.advance_into(n_frames, &mut positions);
        positions
    }

    /// The same as `advance` but appends to the given buffer.
    ///
    /// Each position is the location of the swarm at the start of its frame.
    pub fn advance_into(&mut self, n_frames: usize, positions: &mut Vec<Point2>) {
        let end = positions.len() + n_frames;
        while positions.len() < end {
            let remaining = end - positions.len();

            // Hold position until the linger countdown is exhausted.
            if self.state.linger_frames > 0 {
                let n = std::cmp::min(self.state.linger_frames, remaining);
                positions.extend(std::iter::repeat(self.state.position).take(n));
                self.state.linger_frames -= n;
                continue;
            }

            let target = self.hives[self.state.destination];
            let delta: Vector2 = target - self.state.position;
            let distance = delta.magnitude();

            // Within one step counts as arrived, avoiding exact float comparison.
            if distance <= self.step {
                self.state.position = target;
                positions.push(target);
                self.arrive();
                continue;
            }

            // Walk until the remaining distance falls within a single step.
            let unit = delta / distance;
            let frames_to_arrival = (distance / self.step).floor() as usize;
            let n = std::cmp::min(frames_to_arrival, remaining).max(1);
            let start = self.state.position;
            for i in 0..n {
                positions.push(start + unit * (self.step * i as f64));
            }
            self.state.position = start + unit * (self.step * n as f64);
        }
    }

    // Choose the next destination and begin lingering.
    //
    // The arrival frame has already been emitted, so it counts toward the linger.
    fn arrive(&mut self) {
        let n_hives = self.hives.len();
        if self.rng.gen_bool(self.p_change_direction) {
            self.state.direction = -self.state.direction;
        }
        let next = self.state.destination as isize + self.state.direction;
        self.state.destination = next.rem_euclid(n_hives as isize) as usize;
        if self.rng.gen_bool(self.p_jump_hives) {
            self.state.destination = self.rng.gen_range(0..n_hives);
        }
        self.state.linger_frames = self.linger_frames.saturating_sub(1);
        log::trace!(
            "swarm arrived at ({:.2}, {:.2}), next destination hive {}",
            self.state.position.x,
            self.state.position.y,
            self.state.destination,
        );
    }

    /// The distance from the swarm to its destination hive.
    pub fn distance_to_destination(&self) -> Metres {
        self.state.position.distance(self.hives[self.state.destination])
    }
}

fn check_probability(name: &'static str, p: f64) -> Result<()> {
    if (0.0..=1.0).contains(&p) {
        Ok(())
    } else {
        Err(Error::invalid(name, format!("probability {} must lie within [0, 1]", p)))
    }
}
