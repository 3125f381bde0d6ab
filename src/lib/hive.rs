//! Declarations and definitions related to the hives (loudspeakers) of the installation.
//!
//! The set of hives is fixed at startup. The index of a hive within the set is the output channel
//! on which it is rendered.

use crate::metres::{Metres, Point2};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::fmt;

/// A single hive at a fixed location within the space.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Hive {
    /// A human readable name used in logs.
    pub name: String,
    /// The location of the hive in metres.
    pub point: Point2,
}

impl Hive {
    pub fn new(name: impl Into<String>, point: Point2) -> Self {
        Hive {
            name: name.into(),
            point,
        }
    }
}

impl fmt::Display for Hive {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} ({:.2}, {:.2})", self.name, self.point.x, self.point.y)
    }
}

/// Space `n` hives evenly around a circle of the given radius centred on the origin.
///
/// The first hive sits half a step past the positive x axis so that the hives straddle the axes
/// symmetrically. For twelve hives this places one every 30° starting at 15°.
///
/// Only the twelve hive layout matches the installation, which always spaces hives 30° apart
/// starting at 15°. Other counts are spread over the whole circle instead.
pub fn circle(n: usize, radius: Metres) -> Vec<Hive> {
    let step = 2.0 * PI / n.max(1) as f64;
    (0..n)
        .map(|i| {
            let theta = step * 0.5 + step * i as f64;
            let point = Point2::new(radius * theta.cos(), radius * theta.sin());
            Hive::new(format!("hive-{}", i), point)
        })
        .collect()
}

/// Produce only the points of the given hives, in channel order.
pub fn points(hives: &[Hive]) -> Vec<Point2> {
    hives.iter().map(|h| h.point).collect()
}

#[test]
fn twelve_hive_circle() {
    use cgmath::MetricSpace;

    let hives = circle(12, 3.0);
    assert_eq!(hives.len(), 12);
    let origin = Point2::new(0.0, 0.0);
    for hive in &hives {
        assert!((hive.point.distance(origin) - 3.0).abs() < 1e-9);
    }
    let first = PI / 12.0;
    assert!((hives[0].point.x - 3.0 * first.cos()).abs() < 1e-9);
    assert!((hives[0].point.y - 3.0 * first.sin()).abs() < 1e-9);
    assert_eq!(hives[3].name, "hive-3");
}

#[test]
fn four_hive_circle_spans_the_whole_circle() {
    let hives = circle(4, 1.0);
    let angles: Vec<f64> = hives
        .iter()
        .map(|h| h.point.y.atan2(h.point.x).to_degrees().rem_euclid(360.0))
        .collect();
    for (angle, expected) in angles.iter().zip(&[45.0, 135.0, 225.0, 315.0]) {
        assert!((angle - expected).abs() < 1e-9);
    }
}
